use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::{ChatRepository, ProfileRepository, UserRepository};
use shared_models::chat::{Conversation, Message, MessageStatus, SenderType};
use shared_models::profile::DoctorStatus;
use shared_models::user::User;
use shared_utils::realtime::ConversationHub;
use shared_utils::AppState;

use crate::models::{
    ChatError, ChatMessageNotification, ConversationResponse, MessageResponse, Participant,
    StartedConversation, MAX_MESSAGE_LENGTH,
};

/// Conversation operations for the two participants. The persisted message
/// is the source of truth; the hub notification is best effort.
pub struct ChatService {
    chat: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    hub: ConversationHub,
}

impl ChatService {
    pub fn new(state: &AppState) -> Self {
        Self {
            chat: state.repos.chat.clone(),
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
            hub: state.hub.clone(),
        }
    }

    #[instrument(skip(self, content))]
    pub async fn start_conversation(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        content: &str,
    ) -> Result<StartedConversation, ChatError> {
        let content = validate_content(content)?;

        let doctor = self.profiles.find_doctor_profile(doctor_id).await?;
        if !doctor.is_some_and(|p| p.status == DoctorStatus::Active) {
            return Err(ChatError::DoctorNotFound);
        }

        if self.chat.find_conversation_by_pair(doctor_id, patient_id).await?.is_some() {
            debug!("Patient {} already talks to doctor {}", patient_id, doctor_id);
            return Err(ChatError::AlreadyExists);
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            created_at: now,
            last_message_at: now,
        };
        let message = new_message(conversation.id, Participant::patient(patient_id), content);
        self.chat
            .create_conversation(&conversation, &message)
            .await
            .map_err(ChatError::from_store)?;

        info!("Conversation {} started", conversation.id);
        self.notify(&message).await;

        Ok(StartedConversation {
            conversation_id: conversation.id,
            message: message.into(),
        })
    }

    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        sender: Participant,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<MessageResponse, ChatError> {
        let content = validate_content(content)?;
        self.load_owned(sender, conversation_id).await?;

        let message = new_message(conversation_id, sender, content);
        self.chat.append_message(&message).await?;

        self.notify(&message).await;
        Ok(message.into())
    }

    /// Reading marks the counterpart's messages READ.
    pub async fn get_messages(&self, viewer: Participant, conversation_id: Uuid) -> Result<Vec<MessageResponse>, ChatError> {
        self.load_owned(viewer, conversation_id).await?;

        let marked = self
            .chat
            .mark_read(conversation_id, viewer.role.counterpart(), Utc::now())
            .await?;
        if marked > 0 {
            debug!("Marked {} messages read in {}", marked, conversation_id);
        }

        let messages = self.chat.list_messages(conversation_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub async fn list_conversations(&self, viewer: Participant) -> Result<Vec<ConversationResponse>, ChatError> {
        let summaries = self.chat.list_conversations(viewer.scope()).await?;

        let ids: Vec<Uuid> = summaries
            .iter()
            .map(|s| viewer.counterpart_of(&s.conversation))
            .collect();
        let names: HashMap<Uuid, User> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(summaries
            .into_iter()
            .map(|summary| {
                let conversation = summary.conversation;
                let counterpart_id = viewer.counterpart_of(&conversation);
                ConversationResponse {
                    id: conversation.id,
                    doctor_id: conversation.doctor_id,
                    patient_id: conversation.patient_id,
                    counterpart_id,
                    counterpart_name: names.get(&counterpart_id).map(User::full_name).unwrap_or_default(),
                    last_message: summary.last_message,
                    last_message_at: conversation.last_message_at,
                    unread_count: summary.unread_count,
                    created_at: conversation.created_at,
                }
            })
            .collect())
    }

    /// Non-participants get `NotFound` so conversation ids do not leak.
    async fn load_owned(&self, participant: Participant, conversation_id: Uuid) -> Result<Conversation, ChatError> {
        self.chat
            .find_conversation(conversation_id)
            .await?
            .filter(|c| participant.owns(c))
            .ok_or(ChatError::NotFound)
    }

    async fn notify(&self, message: &Message) {
        let delivered = self
            .hub
            .publish(message.conversation_id, &ChatMessageNotification::from(message))
            .await;
        debug!("Message {} pushed to {} live viewers", message.id, delivered);
    }
}

fn validate_content(content: &str) -> Result<&str, ChatError> {
    let content = content.trim();
    if content.is_empty() || content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::InvalidMessage);
    }
    Ok(content)
}

fn new_message(conversation_id: Uuid, sender: Participant, content: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id,
        sender_id: sender.user_id,
        sender_type: sender.role,
        content: content.to_string(),
        status: MessageStatus::Sent,
        created_at: Utc::now(),
        read_at: None,
    }
}
