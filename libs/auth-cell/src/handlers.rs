use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AuthError, EmailRequest, LoginRequest, PhoneRequest, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, SetDisabledRequest, VerifyEmailRequest, VerifyPhoneRequest,
};
use crate::services::{
    AccountService, LoginService, PasswordResetService, RegistrationService, TokenService,
    VerificationService,
};

/// The session token may come in the body or as the bearer header.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRefreshTokenRequest {
    pub token: Option<String>,
    pub refresh_token: String,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RegistrationService::new(&state);

    let user_id = service.register(request).await?;

    Ok(Json(json!({
        "userId": user_id,
        "message": "Registration successful. Verify your email or phone number to sign in."
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LoginService::new(&state);

    let response = service.login(request).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TokenService::new(&state);

    let response = service.refresh(&request.token, &request.refresh_token).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn revoke_refresh_token(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(request): Json<RevokeRefreshTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let token = match (&request.token, &bearer) {
        (Some(token), _) => token.as_str(),
        (None, Some(TypedHeader(authorization))) => authorization.token(),
        (None, None) => return Err(AuthError::InvalidToken.into()),
    };

    TokenService::new(&state)
        .revoke(token, &request.refresh_token)
        .await?;

    Ok(Json(json!({ "message": "Refresh token revoked" })))
}

#[axum::debug_handler]
pub async fn send_email_otp(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    VerificationService::new(&state).send_email_otp(&request.email).await?;

    Ok(Json(json!({ "message": "Verification code sent" })))
}

#[axum::debug_handler]
pub async fn send_phone_otp(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<Value>, AppError> {
    VerificationService::new(&state).send_phone_otp(&request.phone_number).await?;

    Ok(Json(json!({ "message": "Verification code sent" })))
}

#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<Value>, AppError> {
    VerificationService::new(&state)
        .verify_email(&request.email, &request.code)
        .await?;

    Ok(Json(json!({ "message": "Email verified" })))
}

#[axum::debug_handler]
pub async fn verify_phone(
    State(state): State<AppState>,
    Json(request): Json<VerifyPhoneRequest>,
) -> Result<Json<Value>, AppError> {
    VerificationService::new(&state)
        .verify_phone(&request.phone_number, &request.code)
        .await?;

    Ok(Json(json!({ "message": "Phone number verified" })))
}

#[axum::debug_handler]
pub async fn send_login_otp(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    VerificationService::new(&state).send_login_otp(&request.email).await?;

    Ok(Json(json!({ "message": "If the account exists, a login code has been sent" })))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    PasswordResetService::new(&state).forgot_password(&request.email).await?;

    Ok(Json(json!({ "message": "If the account exists, a reset code has been sent" })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    PasswordResetService::new(&state).reset_password(request).await?;

    Ok(Json(json!({ "message": "Password has been reset" })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    debug!("Loading account for user {}", user.id);

    let account = AccountService::new(&state).me(user.id).await?;

    Ok(Json(json!(account)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn set_user_disabled(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetDisabledRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {} setting disabled={} on {}", admin.id, request.disabled, user_id);

    AccountService::new(&state)
        .set_disabled(user_id, request.disabled)
        .await?;

    Ok(Json(json!({ "userId": user_id, "disabled": request.disabled })))
}
