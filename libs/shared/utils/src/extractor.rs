use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

pub const INVALID_TOKEN: &str = "User.InvalidJwtToken";

fn invalid_token() -> AppError {
    AppError::unauthorized(INVALID_TOKEN, "Invalid or missing bearer token")
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_value = headers
        .get(AUTHORIZATION)
        .ok_or_else(invalid_token)?
        .to_str()
        .map_err(|_| invalid_token())?;

    auth_value.strip_prefix("Bearer ").ok_or_else(invalid_token)
}

/// Validates the bearer token and places the caller in request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let claims = validate_token(token, &state.config).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        invalid_token()
    })?;

    let user = AuthUser::try_from(claims).map_err(|_| invalid_token())?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<AuthUser, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(invalid_token)
}
