use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Path, State},
    response::Response,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::chat::SenderType;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{Participant, SendMessageRequest, StartConversationRequest};
use crate::services::{stream_conversation, ChatAdminService, ChatService};

fn participant(user: &AuthUser, role: SenderType) -> Participant {
    Participant {
        user_id: user.id,
        role,
    }
}

// ==============================================================================
// PARTICIPANT HANDLERS
// ==============================================================================
// The router layers the caller's side of the conversation as an extension.

#[axum::debug_handler]
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(role): Extension<SenderType>,
) -> Result<Json<Value>, AppError> {
    let conversations = ChatService::new(&state)
        .list_conversations(participant(&user, role))
        .await?;

    Ok(Json(json!(conversations)))
}

#[axum::debug_handler]
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartConversationRequest>,
) -> Result<Json<Value>, AppError> {
    let started = ChatService::new(&state)
        .start_conversation(user.id, request.doctor_id, &request.message)
        .await?;

    Ok(Json(json!(started)))
}

#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(role): Extension<SenderType>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let messages = ChatService::new(&state)
        .get_messages(participant(&user, role), conversation_id)
        .await?;

    Ok(Json(json!(messages)))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(role): Extension<SenderType>,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let message = ChatService::new(&state)
        .send_message(participant(&user, role), conversation_id, &request.content)
        .await?;

    Ok(Json(json!(message)))
}

// ==============================================================================
// LIVE
// ==============================================================================

#[axum::debug_handler]
pub async fn live(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(conversation_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    ChatAdminService::new(&state)
        .authorize_viewer(&user, conversation_id)
        .await?;

    debug!("User {} watching conversation {}", user.id, conversation_id);
    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| stream_conversation(socket, hub, conversation_id)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_list_conversations(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let conversations = ChatAdminService::new(&state).list_conversations().await?;

    Ok(Json(json!({
        "total": conversations.len(),
        "conversations": conversations
    })))
}

#[axum::debug_handler]
pub async fn admin_get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let messages = ChatAdminService::new(&state).get_messages(conversation_id).await?;

    Ok(Json(json!(messages)))
}
