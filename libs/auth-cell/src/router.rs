use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::policy::{enforce_policy, Policy};
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/auth`.
pub fn auth_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/revoke-refresh-token", post(handlers::revoke_refresh_token))
        .route("/send-email-otp", post(handlers::send_email_otp))
        .route("/send-phone-otp", post(handlers::send_phone_otp))
        .route("/verify-email", post(handlers::verify_email))
        .route("/verify-phone", post(handlers::verify_phone))
        .route("/send-login-otp", post(handlers::send_login_otp))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn admin_user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users/{user_id}/disabled", put(handlers::set_user_disabled))
        .route_layer(middleware::from_fn_with_state(Policy::Admin, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
