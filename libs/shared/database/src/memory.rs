use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::chat::{Conversation, ConversationSummary, Message, MessageStatus, SenderType};
use shared_models::profile::{DoctorProfile, DoctorStatus, PatientProfile, PatientStatus};
use shared_models::schedule::{
    Booking, BookingStatus, DayOfWeek, DoctorAvailability, DoctorSchedule, ScheduledBooking,
};
use shared_models::user::{RefreshToken, User};

use crate::error::{StoreError, StoreResult, UniqueKey};
use crate::repository::{
    ChatRepository, ConversationScope, ProfileRepository, RefreshTokenRepository, Reservation,
    ScheduleRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    doctor_profiles: HashMap<Uuid, DoctorProfile>,
    patient_profiles: HashMap<Uuid, PatientProfile>,
    availability: Vec<DoctorAvailability>,
    schedules: HashMap<Uuid, DoctorSchedule>,
    schedule_index: HashMap<(Uuid, NaiveDate), Uuid>,
    bookings: Vec<Booking>,
    conversations: HashMap<Uuid, Conversation>,
    messages: Vec<Message>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

impl Tables {
    fn scheduled(&self, booking: &Booking) -> Option<ScheduledBooking> {
        self.schedules
            .get(&booking.doctor_schedule_id)
            .map(|schedule| ScheduledBooking {
                booking: booking.clone(),
                schedule: schedule.clone(),
            })
    }
}

/// Process-local store. Every operation holds the single table lock for its
/// whole duration, so each trait call is atomic with respect to every other.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueKey::Email));
        }
        if let Some(phone) = &user.phone_number {
            if tables.users.values().any(|u| u.phone_number.as_ref() == Some(phone)) {
                return Err(StoreError::Duplicate(UniqueKey::PhoneNumber));
            }
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_phone(&self, phone_number: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl ProfileRepository for MemoryDatabase {
    async fn insert_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.doctor_profiles.contains_key(&profile.id) {
            return Err(StoreError::Duplicate(UniqueKey::DoctorProfile));
        }
        tables.doctor_profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update_doctor_profile(&self, profile: &DoctorProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.doctor_profiles.get_mut(&profile.id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("doctor profile {}", profile.id))),
        }
    }

    async fn find_doctor_profile(&self, id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        Ok(self.tables.read().await.doctor_profiles.get(&id).cloned())
    }

    async fn list_doctor_profiles(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<DoctorProfile>> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<DoctorProfile> = tables
            .doctor_profiles
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }

    async fn insert_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.patient_profiles.contains_key(&profile.id) {
            return Err(StoreError::Duplicate(UniqueKey::PatientProfile));
        }
        tables.patient_profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update_patient_profile(&self, profile: &PatientProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.patient_profiles.get_mut(&profile.id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("patient profile {}", profile.id))),
        }
    }

    async fn find_patient_profile(&self, id: Uuid) -> StoreResult<Option<PatientProfile>> {
        Ok(self.tables.read().await.patient_profiles.get(&id).cloned())
    }

    async fn list_patient_profiles(&self, status: Option<PatientStatus>) -> StoreResult<Vec<PatientProfile>> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<PatientProfile> = tables
            .patient_profiles
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }
}

#[async_trait]
impl ScheduleRepository for MemoryDatabase {
    async fn replace_availability(&self, doctor_id: Uuid, rows: &[DoctorAvailability]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.availability.retain(|a| a.doctor_id != doctor_id);
        tables.availability.extend(rows.iter().cloned());
        debug!("Replaced availability for doctor {} with {} rows", doctor_id, rows.len());
        Ok(())
    }

    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<DoctorAvailability> = tables
            .availability
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.day_of_week);
        Ok(rows)
    }

    async fn find_availability(&self, doctor_id: Uuid, day: DayOfWeek) -> StoreResult<Option<DoctorAvailability>> {
        let tables = self.tables.read().await;
        Ok(tables
            .availability
            .iter()
            .find(|a| a.doctor_id == doctor_id && a.day_of_week == day)
            .cloned())
    }

    async fn list_availability_for_day(&self, day: DayOfWeek) -> StoreResult<Vec<DoctorAvailability>> {
        let tables = self.tables.read().await;
        Ok(tables
            .availability
            .iter()
            .filter(|a| a.day_of_week == day && a.is_available)
            .cloned()
            .collect())
    }

    async fn insert_missing_schedules(&self, rows: &[DoctorSchedule]) -> StoreResult<Vec<DoctorSchedule>> {
        let mut tables = self.tables.write().await;
        let mut inserted = Vec::new();

        for row in rows {
            let key = (row.doctor_id, row.date);
            if tables.schedule_index.contains_key(&key) {
                continue;
            }
            tables.schedule_index.insert(key, row.id);
            tables.schedules.insert(row.id, row.clone());
            inserted.push(row.clone());
        }

        Ok(inserted)
    }

    async fn list_schedules(
        &self,
        doctor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<DoctorSchedule>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<DoctorSchedule> = tables
            .schedules
            .values()
            .filter(|s| s.doctor_id == doctor_id)
            .filter(|s| from.map_or(true, |f| s.date >= f))
            .filter(|s| to.map_or(true, |t| s.date <= t))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.date);
        Ok(rows)
    }

    async fn set_schedule_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        is_available: bool,
    ) -> StoreResult<Option<DoctorSchedule>> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables.schedule_index.get(&(doctor_id, date)).copied() else {
            return Ok(None);
        };
        Ok(tables.schedules.get_mut(&id).map(|schedule| {
            schedule.is_available = is_available;
            schedule.clone()
        }))
    }

    async fn reserve(&self, patient_id: Uuid, doctor_id: Uuid, date: NaiveDate) -> StoreResult<Reservation> {
        let mut tables = self.tables.write().await;

        let template = tables
            .availability
            .iter()
            .find(|a| a.doctor_id == doctor_id && a.day_of_week == DayOfWeek::of(date))
            .cloned();
        let template = match template {
            Some(t) if t.is_available => t,
            _ => return Ok(Reservation::DoctorUnavailable),
        };

        let existing = tables
            .schedule_index
            .get(&(doctor_id, date))
            .and_then(|id| tables.schedules.get(id))
            .cloned();

        if let Some(schedule) = &existing {
            if !schedule.is_available {
                return Ok(Reservation::ScheduleUnavailable);
            }
        }

        let mut schedule = existing.unwrap_or_else(|| DoctorSchedule::new(doctor_id, date));
        if schedule.booking_count >= template.max_bookings {
            return Ok(Reservation::LimitExceeded);
        }
        schedule.booking_count += 1;

        let booking = Booking {
            id: Uuid::new_v4(),
            patient_id,
            doctor_schedule_id: schedule.id,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };

        tables.schedule_index.insert((doctor_id, date), schedule.id);
        tables.schedules.insert(schedule.id, schedule.clone());
        tables.bookings.push(booking.clone());

        Ok(Reservation::Booked(ScheduledBooking { booking, schedule }))
    }

    async fn list_patient_bookings(&self, patient_id: Uuid) -> StoreResult<Vec<ScheduledBooking>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ScheduledBooking> = tables
            .bookings
            .iter()
            .filter(|b| b.patient_id == patient_id)
            .filter_map(|b| tables.scheduled(b))
            .collect();
        rows.sort_by(|a, b| {
            b.schedule
                .date
                .cmp(&a.schedule.date)
                .then(b.booking.created_at.cmp(&a.booking.created_at))
        });
        Ok(rows)
    }

    async fn list_bookings(&self, offset: u64, limit: u64) -> StoreResult<(Vec<ScheduledBooking>, u64)> {
        let tables = self.tables.read().await;
        let total = tables.bookings.len() as u64;
        // Insertion order is creation order.
        let rows = tables
            .bookings
            .iter()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .filter_map(|b| tables.scheduled(b))
            .collect();
        Ok((rows, total))
    }
}

#[async_trait]
impl ChatRepository for MemoryDatabase {
    async fn create_conversation(&self, conversation: &Conversation, first_message: &Message) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let exists = tables.conversations.values().any(|c| {
            c.doctor_id == conversation.doctor_id && c.patient_id == conversation.patient_id
        });
        if exists {
            return Err(StoreError::Duplicate(UniqueKey::Conversation));
        }
        tables.conversations.insert(conversation.id, conversation.clone());
        tables.messages.push(first_message.clone());
        Ok(())
    }

    async fn find_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        Ok(self.tables.read().await.conversations.get(&id).cloned())
    }

    async fn find_conversation_by_pair(&self, doctor_id: Uuid, patient_id: Uuid) -> StoreResult<Option<Conversation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .conversations
            .values()
            .find(|c| c.doctor_id == doctor_id && c.patient_id == patient_id)
            .cloned())
    }

    async fn list_conversations(&self, scope: ConversationScope) -> StoreResult<Vec<ConversationSummary>> {
        let tables = self.tables.read().await;
        let unread_sender = scope.unread_sender();

        let mut summaries: Vec<ConversationSummary> = tables
            .conversations
            .values()
            .filter(|c| match scope {
                ConversationScope::Doctor(id) => c.doctor_id == id,
                ConversationScope::Patient(id) => c.patient_id == id,
                ConversationScope::All => true,
            })
            .map(|c| {
                let messages: Vec<&Message> = tables
                    .messages
                    .iter()
                    .filter(|m| m.conversation_id == c.id)
                    .collect();
                let unread_count = match unread_sender {
                    Some(sender) => messages
                        .iter()
                        .filter(|m| m.sender_type == sender && m.status != MessageStatus::Read)
                        .count() as u64,
                    None => 0,
                };
                ConversationSummary {
                    conversation: c.clone(),
                    last_message: messages.last().map(|m| m.content.clone()),
                    message_count: messages.len() as u64,
                    unread_count,
                }
            })
            .collect();

        summaries.sort_by(|a, b| b.conversation.last_message_at.cmp(&a.conversation.last_message_at));
        Ok(summaries)
    }

    async fn append_message(&self, message: &Message) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let conversation = tables
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", message.conversation_id)))?;
        if message.created_at > conversation.last_message_at {
            conversation.last_message_at = message.created_at;
        }
        tables.messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> StoreResult<Vec<Message>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_read(&self, conversation_id: Uuid, sender: SenderType, read_at: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for message in tables.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id
                && m.sender_type == sender
                && m.status != MessageStatus::Read
        }) {
            message.status = MessageStatus::Read;
            message.read_at = Some(read_at);
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryDatabase {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.refresh_tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn revoke_refresh_token(&self, user_id: Uuid, token_hash: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.get_mut(token_hash) {
            Some(token) if token.user_id == user_id && token.is_active(at) => {
                token.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut revoked = 0;
        for token in tables
            .refresh_tokens
            .values_mut()
            .filter(|t| t.user_id == user_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(at);
            revoked += 1;
        }
        Ok(revoked)
    }
}
