use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{StoreError, UniqueKey};
use shared_models::error::AppError;
use shared_models::profile::{DoctorStatus, PatientStatus};
use shared_models::user::Gender;

// ==============================================================================
// OTP SCOPES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpContext {
    Verification,
    Login,
    ResetPassword,
}

impl OtpContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpContext::Verification => "verification",
            OtpContext::Login => "login",
            OtpContext::ResetPassword => "reset_password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    Email,
    Phone,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Email => "email",
            IdentifierType::Phone => "phone",
        }
    }
}

/// Exactly one credential kind, resolved from the login request shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCredential {
    Password(String),
    Otp(String),
}

impl LoginCredential {
    /// Blank values count as absent. Supplying both is rejected rather than
    /// picking one.
    pub fn resolve(password: Option<String>, otp: Option<String>) -> Result<Self, AuthError> {
        let password = password.filter(|p| !p.is_empty());
        let otp = otp.map(|o| o.trim().to_string()).filter(|o| !o.is_empty());

        match (password, otp) {
            (Some(password), None) => Ok(LoginCredential::Password(password)),
            (None, Some(code)) => Ok(LoginCredential::Otp(code)),
            (Some(_), Some(_)) => Err(AuthError::AmbiguousCredentials),
            (None, None) => Err(AuthError::MissingCredentials),
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRequest {
    pub phone_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDisabledRequest {
    pub disabled: bool,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub email_confirmed: bool,
    pub phone_number_confirmed: bool,
    pub patient_status: PatientStatus,
    pub doctor_status: DoctorStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub email_confirmed: bool,
    pub phone_number_confirmed: bool,
    pub roles: Vec<String>,
    pub patient_status: PatientStatus,
    pub doctor_status: DoctorStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account has been disabled")]
    DisabledUser,

    #[error("Email or phone number must be verified first")]
    NotVerified,

    #[error("User was not found")]
    UserNotFound,

    #[error("Another user with the same email already exists")]
    EmailDuplicated,

    #[error("Another user with the same phone number already exists")]
    PhoneDuplicated,

    #[error("This identifier is already verified")]
    AlreadyVerified,

    #[error("Invalid or expired code")]
    InvalidOtp,

    #[error("Provide either a password or a one-time code, not both")]
    AmbiguousCredentials,

    #[error("A password or a one-time code is required")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "User.InvalidCredentials",
            AuthError::DisabledUser => "User.DisabledUser",
            AuthError::NotVerified => "User.NotVerified",
            AuthError::UserNotFound => "User.NotFound",
            AuthError::EmailDuplicated => "User.EmailDuplicated",
            AuthError::PhoneDuplicated => "User.PhoneDuplicated",
            AuthError::AlreadyVerified => "User.AlreadyVerified",
            AuthError::InvalidOtp => "Auth.InvalidOtp",
            AuthError::AmbiguousCredentials => "Auth.AmbiguousCredentials",
            AuthError::MissingCredentials => "Auth.MissingCredentials",
            AuthError::InvalidToken => "User.InvalidJwtToken",
            AuthError::InvalidRefreshToken => "User.InvalidRefreshToken",
            AuthError::Validation(_) => "User.InvalidRequest",
            AuthError::Store(_) | AuthError::Internal(_) => shared_models::error::INTERNAL_ERROR_CODE,
        }
    }

    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(UniqueKey::Email) => AuthError::EmailDuplicated,
            StoreError::Duplicate(UniqueKey::PhoneNumber) => AuthError::PhoneDuplicated,
            other => AuthError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        let code = error.code();
        let description = error.to_string();
        match error {
            AuthError::InvalidCredentials
            | AuthError::DisabledUser
            | AuthError::InvalidToken
            | AuthError::InvalidRefreshToken => AppError::unauthorized(code, description),
            AuthError::NotVerified => AppError::forbidden(code, description),
            AuthError::UserNotFound => AppError::not_found(code, description),
            AuthError::EmailDuplicated | AuthError::PhoneDuplicated | AuthError::AlreadyVerified => {
                AppError::conflict(code, description)
            }
            AuthError::InvalidOtp
            | AuthError::AmbiguousCredentials
            | AuthError::MissingCredentials
            | AuthError::Validation(_) => AppError::bad_request(code, description),
            AuthError::Store(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
