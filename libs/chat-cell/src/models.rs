use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{ConversationScope, StoreError, UniqueKey};
use shared_models::chat::{Conversation, Message, MessageStatus, SenderType};
use shared_models::error::AppError;

pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// One side of a conversation, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub user_id: Uuid,
    pub role: SenderType,
}

impl Participant {
    pub fn doctor(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: SenderType::Doctor,
        }
    }

    pub fn patient(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: SenderType::Patient,
        }
    }

    pub fn owns(&self, conversation: &Conversation) -> bool {
        match self.role {
            SenderType::Doctor => conversation.doctor_id == self.user_id,
            SenderType::Patient => conversation.patient_id == self.user_id,
        }
    }

    pub fn scope(&self) -> ConversationScope {
        match self.role {
            SenderType::Doctor => ConversationScope::Doctor(self.user_id),
            SenderType::Patient => ConversationScope::Patient(self.user_id),
        }
    }

    pub fn counterpart_of(&self, conversation: &Conversation) -> Uuid {
        match self.role {
            SenderType::Doctor => conversation.patient_id,
            SenderType::Patient => conversation.doctor_id,
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub doctor_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_type: SenderType,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_type: message.sender_type,
            content: message.content,
            status: message.status,
            created_at: message.created_at,
            read_at: message.read_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub counterpart_id: Uuid,
    pub counterpart_name: String,
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConversationResponse {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub message_count: u64,
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedConversation {
    pub conversation_id: Uuid,
    pub message: MessageResponse,
}

/// Pushed to live viewers of a conversation for every new message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageNotification {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_type: SenderType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for ChatMessageNotification {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_type: message.sender_type,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Conversation not found")]
    NotFound,

    #[error("A conversation with this doctor already exists")]
    AlreadyExists,

    #[error("Message content must be between 1 and {MAX_MESSAGE_LENGTH} characters")]
    InvalidMessage,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ChatError {
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::NotFound => "Conversation.NotFound",
            ChatError::AlreadyExists => "Conversation.AlreadyExists",
            ChatError::InvalidMessage => "Conversation.InvalidMessage",
            ChatError::DoctorNotFound => "Doctor.NotFound",
            ChatError::Store(_) => shared_models::error::INTERNAL_ERROR_CODE,
        }
    }

    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(UniqueKey::Conversation) => ChatError::AlreadyExists,
            other => ChatError::Store(other),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        let code = error.code();
        let description = error.to_string();
        match error {
            ChatError::NotFound | ChatError::DoctorNotFound => AppError::not_found(code, description),
            ChatError::AlreadyExists => AppError::conflict(code, description),
            ChatError::InvalidMessage => AppError::bad_request(code, description),
            ChatError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}
