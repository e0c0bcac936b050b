use axum::{
    middleware,
    routing::get,
    Extension, Router,
};

use shared_models::chat::SenderType;
use shared_utils::extractor::auth_middleware;
use shared_utils::policy::{enforce_policy, Policy};
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/patient/chat`.
pub fn patient_chat_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/conversations",
            get(handlers::list_conversations).post(handlers::start_conversation),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            get(handlers::get_messages).post(handlers::send_message),
        )
        .layer(Extension(SenderType::Patient))
        .route_layer(middleware::from_fn_with_state(Policy::ActivePatient, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/doctor/chat`.
pub fn doctor_chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/conversations", get(handlers::list_conversations))
        .route(
            "/conversations/{conversation_id}/messages",
            get(handlers::get_messages).post(handlers::send_message),
        )
        .layer(Extension(SenderType::Doctor))
        .route_layer(middleware::from_fn_with_state(Policy::ActiveDoctor, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/chat`. Participants and admins only; checked per request.
pub fn live_chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/conversations/{conversation_id}/live", get(handlers::live))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin/chat`.
pub fn admin_chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/conversations", get(handlers::admin_list_conversations))
        .route("/conversations/{conversation_id}/messages", get(handlers::admin_get_messages))
        .route_layer(middleware::from_fn_with_state(Policy::Admin, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
