use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use shared_database::{ChatRepository, ConversationScope, UserRepository};
use shared_models::auth::AuthUser;
use shared_models::chat::Conversation;
use shared_models::user::User;
use shared_utils::AppState;

use crate::models::{AdminConversationResponse, ChatError, MessageResponse};

/// Read-only oversight. Nothing here changes read state.
pub struct ChatAdminService {
    chat: Arc<dyn ChatRepository>,
    users: Arc<dyn UserRepository>,
}

impl ChatAdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            chat: state.repos.chat.clone(),
            users: state.repos.users.clone(),
        }
    }

    pub async fn list_conversations(&self) -> Result<Vec<AdminConversationResponse>, ChatError> {
        let summaries = self.chat.list_conversations(ConversationScope::All).await?;

        let mut ids: Vec<Uuid> = summaries
            .iter()
            .flat_map(|s| [s.conversation.doctor_id, s.conversation.patient_id])
            .collect();
        ids.sort();
        ids.dedup();
        let users: HashMap<Uuid, User> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let name = |id: &Uuid| users.get(id).map(User::full_name).unwrap_or_default();

        Ok(summaries
            .into_iter()
            .map(|summary| {
                let conversation = summary.conversation;
                AdminConversationResponse {
                    id: conversation.id,
                    doctor_id: conversation.doctor_id,
                    doctor_name: name(&conversation.doctor_id),
                    patient_id: conversation.patient_id,
                    patient_name: name(&conversation.patient_id),
                    message_count: summary.message_count,
                    last_message: summary.last_message,
                    last_message_at: conversation.last_message_at,
                    created_at: conversation.created_at,
                }
            })
            .collect())
    }

    pub async fn get_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageResponse>, ChatError> {
        if self.chat.find_conversation(conversation_id).await?.is_none() {
            return Err(ChatError::NotFound);
        }

        let messages = self.chat.list_messages(conversation_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// Who may watch a conversation live: either participant, or an admin.
    pub async fn authorize_viewer(&self, user: &AuthUser, conversation_id: Uuid) -> Result<Conversation, ChatError> {
        let conversation = self
            .chat
            .find_conversation(conversation_id)
            .await?
            .ok_or(ChatError::NotFound)?;

        if conversation.involves(user.id) || user.is_admin() {
            Ok(conversation)
        } else {
            Err(ChatError::NotFound)
        }
    }
}
