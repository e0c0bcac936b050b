use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::chat::{Conversation, ConversationSummary, Message, SenderType};
use shared_models::profile::{DoctorProfile, DoctorStatus, PatientProfile, PatientStatus};
use shared_models::schedule::{
    Booking, DayOfWeek, DoctorAvailability, DoctorSchedule, ScheduledBooking,
};
use shared_models::user::{RefreshToken, User};

use crate::error::{StoreError, StoreResult};
use crate::repository::{
    ChatRepository, ConversationScope, ProfileRepository, RefreshTokenRepository, Reservation,
    ScheduleRepository, UserRepository,
};
use crate::supabase::{prefer, SupabaseClient, PREFER_REPRESENTATION};

const USERS: &str = "/rest/v1/users";
const DOCTOR_PROFILES: &str = "/rest/v1/doctor_profiles";
const PATIENT_PROFILES: &str = "/rest/v1/patient_profiles";
const AVAILABILITIES: &str = "/rest/v1/doctor_availabilities";
const SCHEDULES: &str = "/rest/v1/doctor_schedules";
const BOOKINGS: &str = "/rest/v1/bookings";
const MESSAGES: &str = "/rest/v1/messages";
const CONVERSATIONS: &str = "/rest/v1/conversations";
const REFRESH_TOKENS: &str = "/rest/v1/refresh_tokens";

const BOOKING_SELECT: &str = "*,schedule:doctor_schedules(*)";

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

#[derive(Debug, Deserialize)]
struct BookingRow {
    #[serde(flatten)]
    booking: Booking,
    schedule: DoctorSchedule,
}

impl From<BookingRow> for ScheduledBooking {
    fn from(row: BookingRow) -> Self {
        ScheduledBooking {
            booking: row.booking,
            schedule: row.schedule,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReservationResult {
    outcome: String,
    booking: Option<Booking>,
    schedule: Option<DoctorSchedule>,
}

#[derive(Debug, Deserialize)]
struct ConversationRow {
    id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    created_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
    last_message: Option<String>,
    message_count: u64,
    unread_count: u64,
}

impl From<ConversationRow> for ConversationSummary {
    fn from(row: ConversationRow) -> Self {
        ConversationSummary {
            conversation: Conversation {
                id: row.id,
                doctor_id: row.doctor_id,
                patient_id: row.patient_id,
                created_at: row.created_at,
                last_message_at: row.last_message_at,
            },
            last_message: row.last_message,
            message_count: row.message_count,
            unread_count: row.unread_count,
        }
    }
}

/// Repositories over Supabase PostgREST. Multi-row writes go through the
/// Postgres functions in `migrations/0001_clinic.sql` so each runs in one
/// transaction.
#[derive(Clone)]
pub struct SupabaseDatabase {
    client: SupabaseClient,
}

impl SupabaseDatabase {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    pub fn with_client(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn find_one<T>(&self, path: &str, query: &[(&str, String)]) -> StoreResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut query = query.to_vec();
        query.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.client.request(Method::GET, path, &query, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn patch_returning<T>(&self, path: &str, query: &[(&str, String)], body: Value) -> StoreResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.client
            .request_with_headers(Method::PATCH, path, query, Some(body), Some(prefer(PREFER_REPRESENTATION)))
            .await
    }
}

#[async_trait]
impl UserRepository for SupabaseDatabase {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.client.execute(Method::POST, USERS, &[], Some(to_json(user)?)).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let updated: Vec<Value> = self
            .patch_returning(USERS, &[("id", eq(user.id))], to_json(user)?)
            .await?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.find_one(USERS, &[("id", eq(id))]).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one(USERS, &[("email", eq(email))]).await
    }

    async fn find_user_by_phone(&self, phone_number: &str) -> StoreResult<Option<User>> {
        self.find_one(USERS, &[("phone_number", eq(phone_number))]).await
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        self.client
            .request(Method::GET, USERS, &[("id", format!("in.({})", list))], None)
            .await
    }
}

#[async_trait]
impl ProfileRepository for SupabaseDatabase {
    async fn insert_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()> {
        self.client.execute(Method::POST, DOCTOR_PROFILES, &[], Some(to_json(profile)?)).await
    }

    async fn update_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()> {
        let updated: Vec<Value> = self
            .patch_returning(DOCTOR_PROFILES, &[("id", eq(profile.id))], to_json(profile)?)
            .await?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(format!("doctor profile {}", profile.id)));
        }
        Ok(())
    }

    async fn find_doctor_profile(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        self.find_one(DOCTOR_PROFILES, &[("id", eq(id))]).await
    }

    async fn list_doctor_profiles(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<DoctorProfile>> {
        let mut query = vec![("order", "created_at.asc".to_string())];
        if let Some(status) = status {
            query.push(("status", eq(status.as_str())));
        }
        self.client.request(Method::GET, DOCTOR_PROFILES, &query, None).await
    }

    async fn insert_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()> {
        self.client.execute(Method::POST, PATIENT_PROFILES, &[], Some(to_json(profile)?)).await
    }

    async fn update_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()> {
        let updated: Vec<Value> = self
            .patch_returning(PATIENT_PROFILES, &[("id", eq(profile.id))], to_json(profile)?)
            .await?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(format!("patient profile {}", profile.id)));
        }
        Ok(())
    }

    async fn find_patient_profile(&self, id: Uuid) -> StoreResult<Option<PatientProfile>> {
        self.find_one(PATIENT_PROFILES, &[("id", eq(id))]).await
    }

    async fn list_patient_profiles(&self, status: Option<PatientStatus>) -> StoreResult<Vec<PatientProfile>> {
        let mut query = vec![("order", "created_at.asc".to_string())];
        if let Some(status) = status {
            query.push(("status", eq(status.as_str())));
        }
        self.client.request(Method::GET, PATIENT_PROFILES, &query, None).await
    }
}

#[async_trait]
impl ScheduleRepository for SupabaseDatabase {
    async fn replace_availability(&self, doctor_id: Uuid, rows: &[DoctorAvailability]) -> StoreResult<()> {
        let _: Value = self
            .client
            .rpc(
                "replace_availability",
                json!({ "p_doctor_id": doctor_id, "p_rows": to_json(&rows)? }),
            )
            .await?;
        Ok(())
    }

    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>> {
        let mut rows: Vec<DoctorAvailability> = self
            .client
            .request(Method::GET, AVAILABILITIES, &[("doctor_id", eq(doctor_id))], None)
            .await?;
        rows.sort_by_key(|a| a.day_of_week);
        Ok(rows)
    }

    async fn find_availability(&self, doctor_id: Uuid, day: DayOfWeek) -> StoreResult<Option<DoctorAvailability>> {
        self.find_one(
            AVAILABILITIES,
            &[("doctor_id", eq(doctor_id)), ("day_of_week", eq(day.as_str()))],
        )
        .await
    }

    async fn list_availability_for_day(&self, day: DayOfWeek) -> StoreResult<Vec<DoctorAvailability>> {
        self.client
            .request(
                Method::GET,
                AVAILABILITIES,
                &[("day_of_week", eq(day.as_str())), ("is_available", "is.true".to_string())],
                None,
            )
            .await
    }

    async fn insert_missing_schedules(&self, rows: &[DoctorSchedule]) -> StoreResult<Vec<DoctorSchedule>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        // ignore-duplicates only returns the rows that were actually inserted
        let inserted: Vec<DoctorSchedule> = self
            .client
            .request_with_headers(
                Method::POST,
                SCHEDULES,
                &[("on_conflict", "doctor_id,date".to_string())],
                Some(to_json(&rows)?),
                Some(prefer("resolution=ignore-duplicates,return=representation")),
            )
            .await?;
        debug!("Materialized {} of {} schedule rows", inserted.len(), rows.len());
        Ok(inserted)
    }

    async fn list_schedules(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<DoctorSchedule>> {
        let mut query = vec![("doctor_id", eq(doctor_id)), ("order", "date.asc".to_string())];
        if let Some(from) = from {
            query.push(("date", format!("gte.{}", from)));
        }
        if let Some(to) = to {
            query.push(("date", format!("lte.{}", to)));
        }
        self.client.request(Method::GET, SCHEDULES, &query, None).await
    }

    async fn set_schedule_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        is_available: bool,
    ) -> StoreResult<Option<DoctorSchedule>> {
        let rows: Vec<DoctorSchedule> = self
            .patch_returning(
                SCHEDULES,
                &[("doctor_id", eq(doctor_id)), ("date", eq(date))],
                json!({ "is_available": is_available }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn reserve(&self, patient_id: Uuid, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Reservation> {
        let result: ReservationResult = self
            .client
            .rpc(
                "book_appointment",
                json!({ "p_patient_id": patient_id, "p_doctor_id": doctor_id, "p_date": date }),
            )
            .await?;

        match (result.outcome.as_str(), result.booking, result.schedule) {
            ("booked", Some(booking), Some(schedule)) => {
                Ok(Reservation::Booked(ScheduledBooking { booking, schedule }))
            }
            ("doctor_unavailable", _, _) => Ok(Reservation::DoctorUnavailable),
            ("schedule_unavailable", _, _) => Ok(Reservation::ScheduleUnavailable),
            ("limit_exceeded", _, _) => Ok(Reservation::LimitExceeded),
            (other, _, _) => {
                warn!("Unexpected book_appointment outcome: {}", other);
                Err(StoreError::Backend(format!("Unexpected booking outcome '{}'", other)))
            }
        }
    }

    async fn list_patient_bookings(&self, patient_id: Uuid) -> StoreResult<Vec<ScheduledBooking>> {
        let rows: Vec<BookingRow> = self
            .client
            .request(
                Method::GET,
                BOOKINGS,
                &[("patient_id", eq(patient_id)), ("select", BOOKING_SELECT.to_string())],
                None,
            )
            .await?;
        let mut bookings: Vec<ScheduledBooking> = rows.into_iter().map(Into::into).collect();
        bookings.sort_by(|a, b| {
            b.schedule
                .date
                .cmp(&a.schedule.date)
                .then(b.booking.created_at.cmp(&a.booking.created_at))
        });
        Ok(bookings)
    }

    async fn list_bookings(&self, offset: u64, limit: u64) -> StoreResult<(Vec<ScheduledBooking>, u64)> {
        let (rows, total): (Vec<BookingRow>, u64) = self
            .client
            .request_with_count(
                BOOKINGS,
                &[
                    ("select", BOOKING_SELECT.to_string()),
                    ("order", "created_at.desc".to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}

#[async_trait]
impl ChatRepository for SupabaseDatabase {
    async fn create_conversation(&self, conversation: &Conversation, first_message: &Message) -> StoreResult<()> {
        let _: Value = self
            .client
            .rpc(
                "start_conversation",
                json!({
                    "p_conversation": to_json(conversation)?,
                    "p_message": to_json(first_message)?,
                }),
            )
            .await?;
        Ok(())
    }

    async fn find_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        self.find_one(CONVERSATIONS, &[("id", eq(id))]).await
    }

    async fn find_conversation_by_pair(&self, doctor_id: Uuid, patient_id: Uuid) -> StoreResult<Option<Conversation>> {
        self.find_one(
            CONVERSATIONS,
            &[("doctor_id", eq(doctor_id)), ("patient_id", eq(patient_id))],
        )
        .await
    }

    async fn list_conversations(&self, scope: ConversationScope) -> StoreResult<Vec<ConversationSummary>> {
        let (doctor_id, patient_id) = match scope {
            ConversationScope::Doctor(id) => (Some(id), None),
            ConversationScope::Patient(id) => (None, Some(id)),
            ConversationScope::All => (None, None),
        };
        let rows: Vec<ConversationRow> = self
            .client
            .rpc(
                "list_conversations",
                json!({
                    "p_doctor_id": doctor_id,
                    "p_patient_id": patient_id,
                    "p_unread_sender": scope.unread_sender(),
                }),
            )
            .await?;
        let mut summaries: Vec<ConversationSummary> = rows.into_iter().map(Into::into).collect();
        summaries.sort_by(|a, b| b.conversation.last_message_at.cmp(&a.conversation.last_message_at));
        Ok(summaries)
    }

    async fn append_message(&self, message: &Message) -> StoreResult<()> {
        let _: Value = self
            .client
            .rpc("append_message", json!({ "p_message": to_json(message)? }))
            .await?;
        Ok(())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> StoreResult<Vec<Message>> {
        self.client
            .request(
                Method::GET,
                MESSAGES,
                &[
                    ("conversation_id", eq(conversation_id)),
                    ("order", "created_at.asc,seq.asc".to_string()),
                ],
                None,
            )
            .await
    }

    async fn mark_read(&self, conversation_id: Uuid, sender: SenderType, read_at: DateTime<Utc>) -> StoreResult<u64> {
        let sender = serde_json::to_value(sender)?;
        let sender = sender.as_str().unwrap_or_default().to_string();
        let changed: Vec<Value> = self
            .patch_returning(
                MESSAGES,
                &[
                    ("conversation_id", eq(conversation_id)),
                    ("sender_type", eq(sender)),
                    ("status", "neq.READ".to_string()),
                ],
                json!({ "status": "READ", "read_at": read_at }),
            )
            .await?;
        Ok(changed.len() as u64)
    }
}

#[async_trait]
impl RefreshTokenRepository for SupabaseDatabase {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()> {
        self.client.execute(Method::POST, REFRESH_TOKENS, &[], Some(to_json(token)?)).await
    }

    async fn revoke_refresh_token(&self, user_id: Uuid, token_hash: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let revoked: Vec<Value> = self
            .patch_returning(
                REFRESH_TOKENS,
                &[
                    ("token_hash", eq(token_hash)),
                    ("user_id", eq(user_id)),
                    ("revoked_at", "is.null".to_string()),
                    ("expires_at", format!("gt.{}", at.to_rfc3339())),
                ],
                json!({ "revoked_at": at }),
            )
            .await?;
        Ok(!revoked.is_empty())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let revoked: Vec<Value> = self
            .patch_returning(
                REFRESH_TOKENS,
                &[("user_id", eq(user_id)), ("revoked_at", "is.null".to_string())],
                json!({ "revoked_at": at }),
            )
            .await?;
        Ok(revoked.len() as u64)
    }
}
