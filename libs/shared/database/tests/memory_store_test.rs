use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use uuid::Uuid;

use shared_database::{
    ChatRepository, ConversationScope, MemoryDatabase, RefreshTokenRepository, Reservation,
    ScheduleRepository, StoreError, UniqueKey, UserRepository,
};
use shared_models::chat::{Conversation, Message, MessageStatus, SenderType};
use shared_models::schedule::{DayOfWeek, DoctorAvailability, DoctorSchedule};
use shared_models::user::{Gender, RefreshToken, User};

fn monday() -> NaiveDate {
    // 2030-01-07 is a Monday
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

fn template(doctor_id: Uuid, day: DayOfWeek, max_bookings: u32) -> DoctorAvailability {
    DoctorAvailability {
        id: Uuid::new_v4(),
        doctor_id,
        day_of_week: day,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        max_bookings,
        is_available: true,
    }
}

fn user(email: &str, phone: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        phone_number: phone.map(str::to_string),
        password_hash: "hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        gender: Gender::Female,
        email_confirmed: false,
        phone_number_confirmed: false,
        is_disabled: false,
        roles: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn concurrent_reservations_never_exceed_capacity() {
    let store = Arc::new(MemoryDatabase::new());
    let doctor_id = Uuid::new_v4();
    store
        .replace_availability(doctor_id, &[template(doctor_id, DayOfWeek::Monday, 3)])
        .await
        .unwrap();

    let attempts = (0..10).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.reserve(Uuid::new_v4(), doctor_id, monday()).await })
    });

    let results: Vec<Reservation> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let booked = results.iter().filter(|r| matches!(r, Reservation::Booked(_))).count();
    let rejected = results.iter().filter(|r| matches!(r, Reservation::LimitExceeded)).count();
    assert_eq!(booked, 3);
    assert_eq!(rejected, 7);

    let schedules = store.list_schedules(doctor_id, None, None).await.unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].booking_count, 3);

    let (all, total) = store.list_bookings(0, 100).await.unwrap();
    assert_eq!(total, 3);
    assert!(all.iter().all(|b| b.booking.doctor_schedule_id == schedules[0].id));
}

#[tokio::test]
async fn reservation_without_template_writes_nothing() {
    let store = MemoryDatabase::new();
    let doctor_id = Uuid::new_v4();
    store
        .replace_availability(doctor_id, &[template(doctor_id, DayOfWeek::Tuesday, 3)])
        .await
        .unwrap();

    let outcome = store.reserve(Uuid::new_v4(), doctor_id, monday()).await.unwrap();

    assert_eq!(outcome, Reservation::DoctorUnavailable);
    assert!(store.list_schedules(doctor_id, None, None).await.unwrap().is_empty());
    assert_eq!(store.list_bookings(0, 10).await.unwrap().1, 0);
}

#[tokio::test]
async fn pulled_schedule_day_rejects_reservations() {
    let store = MemoryDatabase::new();
    let doctor_id = Uuid::new_v4();
    store
        .replace_availability(doctor_id, &[template(doctor_id, DayOfWeek::Monday, 3)])
        .await
        .unwrap();
    store
        .insert_missing_schedules(&[DoctorSchedule::new(doctor_id, monday())])
        .await
        .unwrap();
    store.set_schedule_availability(doctor_id, monday(), false).await.unwrap();

    let outcome = store.reserve(Uuid::new_v4(), doctor_id, monday()).await.unwrap();

    assert_eq!(outcome, Reservation::ScheduleUnavailable);
}

#[tokio::test]
async fn insert_missing_schedules_only_fills_gaps() {
    let store = MemoryDatabase::new();
    let doctor_id = Uuid::new_v4();
    let first = DoctorSchedule::new(doctor_id, monday());

    let inserted = store.insert_missing_schedules(&[first.clone()]).await.unwrap();
    assert_eq!(inserted.len(), 1);

    let again = DoctorSchedule::new(doctor_id, monday());
    let next_day = DoctorSchedule::new(doctor_id, monday() + Duration::days(1));
    let inserted = store.insert_missing_schedules(&[again, next_day.clone()]).await.unwrap();

    assert_eq!(inserted, vec![next_day]);
    let rows = store.list_schedules(doctor_id, None, None).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, first.id);
}

#[tokio::test]
async fn duplicate_email_and_phone_are_rejected() {
    let store = MemoryDatabase::new();
    store.insert_user(&user("a@clinic.test", Some("+15550001"))).await.unwrap();

    let email_clash = store.insert_user(&user("a@clinic.test", None)).await;
    assert_matches!(email_clash, Err(StoreError::Duplicate(UniqueKey::Email)));

    let phone_clash = store.insert_user(&user("b@clinic.test", Some("+15550001"))).await;
    assert_matches!(phone_clash, Err(StoreError::Duplicate(UniqueKey::PhoneNumber)));
}

#[tokio::test]
async fn unread_counts_follow_mark_read() {
    let store = MemoryDatabase::new();
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let now = Utc::now();
    let conversation = Conversation {
        id: Uuid::new_v4(),
        doctor_id,
        patient_id,
        created_at: now,
        last_message_at: now,
    };
    let message = |sender_id, sender_type, offset| Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        sender_id,
        sender_type,
        content: "hello".to_string(),
        status: MessageStatus::Sent,
        created_at: now + Duration::seconds(offset),
        read_at: None,
    };

    store
        .create_conversation(&conversation, &message(patient_id, SenderType::Patient, 0))
        .await
        .unwrap();
    store.append_message(&message(doctor_id, SenderType::Doctor, 1)).await.unwrap();
    store.append_message(&message(doctor_id, SenderType::Doctor, 2)).await.unwrap();

    let patient_view = store.list_conversations(ConversationScope::Patient(patient_id)).await.unwrap();
    assert_eq!(patient_view[0].unread_count, 2);
    assert_eq!(patient_view[0].message_count, 3);
    assert_eq!(patient_view[0].conversation.last_message_at, now + Duration::seconds(2));

    let changed = store.mark_read(conversation.id, SenderType::Doctor, Utc::now()).await.unwrap();
    assert_eq!(changed, 2);

    let patient_view = store.list_conversations(ConversationScope::Patient(patient_id)).await.unwrap();
    assert_eq!(patient_view[0].unread_count, 0);
    let doctor_view = store.list_conversations(ConversationScope::Doctor(doctor_id)).await.unwrap();
    assert_eq!(doctor_view[0].unread_count, 1);

    let duplicate = store
        .create_conversation(&Conversation { id: Uuid::new_v4(), ..conversation.clone() }, &message(patient_id, SenderType::Patient, 3))
        .await;
    assert_matches!(duplicate, Err(StoreError::Duplicate(UniqueKey::Conversation)));
}

#[tokio::test]
async fn refresh_token_revocation_is_single_use() {
    let store = MemoryDatabase::new();
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    store
        .insert_refresh_token(&RefreshToken {
            token_hash: "digest".to_string(),
            user_id,
            expires_at: now + Duration::days(14),
            created_at: now,
            revoked_at: None,
        })
        .await
        .unwrap();

    assert!(!store.revoke_refresh_token(Uuid::new_v4(), "digest", now).await.unwrap());
    assert!(store.revoke_refresh_token(user_id, "digest", now).await.unwrap());
    assert!(!store.revoke_refresh_token(user_id, "digest", now).await.unwrap());
}
