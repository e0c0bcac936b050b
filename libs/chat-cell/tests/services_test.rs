use assert_matches::assert_matches;
use tokio_test::assert_ok;
use uuid::Uuid;

use chat_cell::models::{ChatError, ChatMessageNotification, Participant};
use chat_cell::services::{ChatAdminService, ChatService};
use shared_models::chat::{MessageStatus, SenderType};
use shared_models::profile::DoctorStatus;
use shared_utils::test_utils::{doctor_profile, test_state, TestConfig, TestUser};
use shared_utils::AppState;

struct Fixture {
    state: AppState,
    doctor: Participant,
    patient: Participant,
}

async fn fixture() -> Fixture {
    let (state, _) = test_state(&TestConfig::default());
    let doctor = TestUser::doctor("doc@clinic.test");
    let patient = TestUser::patient("pat@clinic.test");
    state.repos.users.insert_user(&doctor.to_user()).await.unwrap();
    state.repos.users.insert_user(&patient.to_user()).await.unwrap();
    state
        .repos
        .profiles
        .insert_doctor_profile(&doctor_profile(doctor.id, DoctorStatus::Active))
        .await
        .unwrap();

    Fixture {
        state,
        doctor: Participant::doctor(doctor.id),
        patient: Participant::patient(patient.id),
    }
}

#[tokio::test]
async fn test_reading_marks_counterpart_messages_read() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    let started = service
        .start_conversation(f.patient.user_id, f.doctor.user_id, "Hello doctor")
        .await
        .unwrap();
    let conversation_id = started.conversation_id;

    // The doctor opens the chat and answers.
    assert_ok!(service.get_messages(f.doctor, conversation_id).await);
    let reply = assert_ok!(service.send_message(f.doctor, conversation_id, "Hello, how can I help?").await);
    assert_eq!(reply.status, MessageStatus::Sent);

    let patient_view = service.list_conversations(f.patient).await.unwrap();
    assert_eq!(patient_view[0].unread_count, 1);

    let messages = service.get_messages(f.patient, conversation_id).await.unwrap();
    let read_reply = messages.iter().find(|m| m.id == reply.id).unwrap();
    assert_eq!(read_reply.status, MessageStatus::Read);
    assert!(read_reply.read_at.is_some());

    let doctor_view = service.list_conversations(f.doctor).await.unwrap();
    assert_eq!(doctor_view[0].unread_count, 0);
    assert_eq!(doctor_view[0].counterpart_id, f.patient.user_id);
    assert_eq!(doctor_view[0].counterpart_name, "Test User");
    let patient_view = service.list_conversations(f.patient).await.unwrap();
    assert_eq!(patient_view[0].unread_count, 0);
}

#[tokio::test]
async fn test_own_messages_stay_unread_for_sender_view() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    let started = service
        .start_conversation(f.patient.user_id, f.doctor.user_id, "First")
        .await
        .unwrap();
    service.send_message(f.patient, started.conversation_id, "Second").await.unwrap();

    // The patient reading their own thread does not mark their messages read.
    let messages = service.get_messages(f.patient, started.conversation_id).await.unwrap();
    assert!(messages.iter().all(|m| m.status == MessageStatus::Sent));
    assert_eq!(service.list_conversations(f.doctor).await.unwrap()[0].unread_count, 2);
}

#[tokio::test]
async fn test_one_conversation_per_pair() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    service.start_conversation(f.patient.user_id, f.doctor.user_id, "Hi").await.unwrap();

    let again = service.start_conversation(f.patient.user_id, f.doctor.user_id, "Hi again").await;

    assert_matches!(again, Err(ChatError::AlreadyExists));
    assert_eq!(service.list_conversations(f.patient).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cannot_start_with_inactive_doctor() {
    let f = fixture().await;
    let pending = TestUser::new("pending@clinic.test");
    f.state
        .repos
        .profiles
        .insert_doctor_profile(&doctor_profile(pending.id, DoctorStatus::PendingVerification))
        .await
        .unwrap();
    let service = ChatService::new(&f.state);

    assert_matches!(
        service.start_conversation(f.patient.user_id, pending.id, "Hi").await,
        Err(ChatError::DoctorNotFound)
    );
    assert_matches!(
        service.start_conversation(f.patient.user_id, Uuid::new_v4(), "Hi").await,
        Err(ChatError::DoctorNotFound)
    );
}

#[tokio::test]
async fn test_outsiders_see_not_found() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    let started = service
        .start_conversation(f.patient.user_id, f.doctor.user_id, "Private")
        .await
        .unwrap();
    let stranger = Participant::patient(Uuid::new_v4());

    assert_matches!(
        service.get_messages(stranger, started.conversation_id).await,
        Err(ChatError::NotFound)
    );
    assert_matches!(
        service.send_message(stranger, started.conversation_id, "hey").await,
        Err(ChatError::NotFound)
    );
    // Right user, wrong side of the conversation.
    assert_matches!(
        service
            .get_messages(Participant::doctor(f.patient.user_id), started.conversation_id)
            .await,
        Err(ChatError::NotFound)
    );
}

#[tokio::test]
async fn test_invalid_content_is_rejected() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);

    assert_matches!(
        service.start_conversation(f.patient.user_id, f.doctor.user_id, "  ").await,
        Err(ChatError::InvalidMessage)
    );
    assert!(service.list_conversations(f.patient).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_live_viewers_receive_notifications() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    let started = service
        .start_conversation(f.patient.user_id, f.doctor.user_id, "Hi")
        .await
        .unwrap();
    let mut live = f.state.hub.subscribe(started.conversation_id).await;

    let sent = service.send_message(f.doctor, started.conversation_id, "On my way").await.unwrap();

    let text = live.recv().await.unwrap();
    let notification: ChatMessageNotification = serde_json::from_str(&text).unwrap();
    assert_eq!(notification.message_id, sent.id);
    assert_eq!(notification.sender_type, SenderType::Doctor);
    assert_eq!(notification.content, "On my way");
}

#[tokio::test]
async fn test_admin_reads_without_changing_state() {
    let f = fixture().await;
    let service = ChatService::new(&f.state);
    let started = service
        .start_conversation(f.patient.user_id, f.doctor.user_id, "Hi")
        .await
        .unwrap();
    let admin = ChatAdminService::new(&f.state);

    let listed = admin.list_conversations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].message_count, 1);
    assert_eq!(listed[0].doctor_name, "Test User");

    let messages = admin.get_messages(started.conversation_id).await.unwrap();
    assert_eq!(messages[0].status, MessageStatus::Sent);
    assert_eq!(service.list_conversations(f.doctor).await.unwrap()[0].unread_count, 1);

    assert_matches!(admin.get_messages(Uuid::new_v4()).await, Err(ChatError::NotFound));
}

#[tokio::test]
async fn test_live_viewer_authorization() {
    let f = fixture().await;
    let started = ChatService::new(&f.state)
        .start_conversation(f.patient.user_id, f.doctor.user_id, "Hi")
        .await
        .unwrap();
    let admin = ChatAdminService::new(&f.state);
    let id = started.conversation_id;

    let doctor = TestUser::doctor("doc@clinic.test").with_id(f.doctor.user_id).to_auth_user();
    let patient = TestUser::patient("pat@clinic.test").with_id(f.patient.user_id).to_auth_user();
    let staff = TestUser::admin("admin@clinic.test").to_auth_user();
    let stranger = TestUser::patient("other@clinic.test").to_auth_user();

    assert!(admin.authorize_viewer(&doctor, id).await.is_ok());
    assert!(admin.authorize_viewer(&patient, id).await.is_ok());
    assert!(admin.authorize_viewer(&staff, id).await.is_ok());
    assert_matches!(admin.authorize_viewer(&stranger, id).await, Err(ChatError::NotFound));
}
