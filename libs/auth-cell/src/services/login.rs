use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use shared_database::UserRepository;
use shared_models::user::{normalize_email, User};
use shared_utils::AppState;

use crate::models::{AuthError, AuthResponse, IdentifierType, LoginCredential, LoginRequest, OtpContext};
use crate::services::otp::OtpService;
use crate::services::password::PasswordService;
use crate::services::token::TokenService;

/// One way of proving a login. A mismatch is `Ok(false)`; errors are
/// reserved for infrastructure failures.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, user: &User, secret: &str) -> Result<bool, AuthError>;
}

pub struct PasswordValidator;

#[async_trait]
impl CredentialValidator for PasswordValidator {
    async fn validate(&self, user: &User, secret: &str) -> Result<bool, AuthError> {
        Ok(PasswordService::verify_password(secret, &user.password_hash))
    }
}

/// Consumes a `Login` code issued to the user's email.
pub struct OtpValidator {
    otp: OtpService,
}

#[async_trait]
impl CredentialValidator for OtpValidator {
    async fn validate(&self, user: &User, secret: &str) -> Result<bool, AuthError> {
        self.otp
            .consume(OtpContext::Login, IdentifierType::Email, &user.email, secret)
            .await
    }
}

pub struct LoginService {
    users: Arc<dyn UserRepository>,
    password: PasswordValidator,
    otp: OtpValidator,
    tokens: TokenService,
}

impl LoginService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            password: PasswordValidator,
            otp: OtpValidator {
                otp: OtpService::new(state),
            },
            tokens: TokenService::new(state),
        }
    }

    /// Check order: credential shape, account exists, verified, credential,
    /// not disabled. Unknown accounts and bad credentials look the same.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let credential = LoginCredential::resolve(request.password, request.otp)?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_verified() {
            return Err(AuthError::NotVerified);
        }

        let (validator, secret): (&dyn CredentialValidator, &str) = match &credential {
            LoginCredential::Password(password) => (&self.password, password.as_str()),
            LoginCredential::Otp(code) => (&self.otp, code.as_str()),
        };
        if !validator.validate(&user, secret).await? {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        if user.is_disabled {
            return Err(AuthError::DisabledUser);
        }

        info!("User {} logged in", user.id);
        self.tokens.issue_session(&user).await
    }
}
