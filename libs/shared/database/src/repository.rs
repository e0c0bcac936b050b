use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use shared_models::chat::{Conversation, ConversationSummary, Message, SenderType};
use shared_models::profile::{DoctorProfile, DoctorStatus, PatientProfile, PatientStatus};
use shared_models::schedule::{DayOfWeek, DoctorAvailability, DoctorSchedule, ScheduledBooking};
use shared_models::user::{RefreshToken, User};

use crate::error::StoreResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Duplicate(Email | PhoneNumber)` when either is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_phone(&self, phone_number: &str) -> StoreResult<Option<User>>;
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fails with `Duplicate(DoctorProfile)` when a row for the user exists.
    async fn insert_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()>;
    async fn update_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()>;
    async fn find_doctor_profile(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>>;
    async fn list_doctor_profiles(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<DoctorProfile>>;

    /// Fails with `Duplicate(PatientProfile)` when a row for the user exists.
    async fn insert_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()>;
    async fn update_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()>;
    async fn find_patient_profile(&self, id: Uuid) -> StoreResult<Option<PatientProfile>>;
    async fn list_patient_profiles(&self, status: Option<PatientStatus>) -> StoreResult<Vec<PatientProfile>>;
}

/// Result of an atomic booking attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    Booked(ScheduledBooking),
    DoctorUnavailable,
    ScheduleUnavailable,
    LimitExceeded,
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Deletes every template of the doctor and inserts `rows`, as one unit.
    async fn replace_availability(&self, doctor_id: Uuid, rows: &[DoctorAvailability]) -> StoreResult<()>;
    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>>;
    async fn find_availability(&self, doctor_id: Uuid, day: DayOfWeek) -> StoreResult<Option<DoctorAvailability>>;
    /// Available templates of every doctor for one weekday.
    async fn list_availability_for_day(&self, day: DayOfWeek) -> StoreResult<Vec<DoctorAvailability>>;

    /// Inserts the rows whose (doctor_id, date) is not yet materialized and
    /// returns only those. Existing rows are left untouched.
    async fn insert_missing_schedules(&self, rows: &[DoctorSchedule]) -> StoreResult<Vec<DoctorSchedule>>;
    /// Ascending by date, bounds inclusive.
    async fn list_schedules(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<DoctorSchedule>>;
    async fn set_schedule_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        is_available: bool,
    ) -> StoreResult<Option<DoctorSchedule>>;

    /// The capacity-checked write path. The template lookup, lazy schedule
    /// creation, both availability checks, the capacity check, the booking
    /// insert and the counter increment happen as one serialized unit per
    /// (doctor_id, date).
    async fn reserve(&self, patient_id: Uuid, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Reservation>;
    /// Newest date first.
    async fn list_patient_bookings(&self, patient_id: Uuid) -> StoreResult<Vec<ScheduledBooking>>;
    /// Newest booking first, with the total row count.
    async fn list_bookings(&self, offset: u64, limit: u64) -> StoreResult<(Vec<ScheduledBooking>, u64)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationScope {
    Doctor(Uuid),
    Patient(Uuid),
    All,
}

impl ConversationScope {
    /// Whose messages count as unread for this viewer.
    pub fn unread_sender(&self) -> Option<SenderType> {
        match self {
            ConversationScope::Doctor(_) => Some(SenderType::Patient),
            ConversationScope::Patient(_) => Some(SenderType::Doctor),
            ConversationScope::All => None,
        }
    }
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Creates the conversation together with its first message. Fails with
    /// `Duplicate(Conversation)` when the pair already has one.
    async fn create_conversation(&self, conversation: &Conversation, first_message: &Message) -> StoreResult<()>;
    async fn find_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>>;
    async fn find_conversation_by_pair(&self, doctor_id: Uuid, patient_id: Uuid) -> StoreResult<Option<Conversation>>;
    /// Sorted by `last_message_at` descending.
    async fn list_conversations(&self, scope: ConversationScope) -> StoreResult<Vec<ConversationSummary>>;
    /// Appends and moves the conversation's `last_message_at` forward.
    async fn append_message(&self, message: &Message) -> StoreResult<()>;
    /// Ascending by `created_at`, ties in insertion order.
    async fn list_messages(&self, conversation_id: Uuid) -> StoreResult<Vec<Message>>;
    /// Marks every non-READ message from `sender` as READ. Returns how many changed.
    async fn mark_read(&self, conversation_id: Uuid, sender: SenderType, read_at: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()>;
    /// Revokes the token if it belongs to `user_id` and is still active.
    /// Returns false when there was nothing to revoke, so a token is single use.
    async fn revoke_refresh_token(&self, user_id: Uuid, token_hash: &str, at: DateTime<Utc>) -> StoreResult<bool>;
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64>;
}

/// Handles to every repository, shared by all cells.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub chat: Arc<dyn ChatRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl Repositories {
    /// All repositories backed by one store value.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProfileRepository
            + ScheduleRepository
            + ChatRepository
            + RefreshTokenRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            profiles: store.clone(),
            schedules: store.clone(),
            chat: store.clone(),
            refresh_tokens: store,
        }
    }
}
