use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use shared_database::UserRepository;
use shared_models::user::normalize_email;
use shared_utils::delivery::{DeliveryChannel, OtpDelivery};
use shared_utils::AppState;

use crate::models::{AuthError, IdentifierType, OtpContext, ResetPasswordRequest};
use crate::services::otp::OtpService;
use crate::services::password::PasswordService;
use crate::services::token::TokenService;
use crate::services::verification::dispatch;

/// Forgot-password flow over `ResetPassword` codes sent by email.
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    otp: OtpService,
    delivery: Arc<dyn OtpDelivery>,
    tokens: TokenService,
}

impl PasswordResetService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            otp: OtpService::new(state),
            delivery: state.otp_delivery.clone(),
            tokens: TokenService::new(state),
        }
    }

    /// Succeeds for unknown addresses too.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_user_by_email(&email).await? else {
            info!("Reset code not issued");
            return Ok(());
        };

        let code = self
            .otp
            .issue(OtpContext::ResetPassword, IdentifierType::Email, &user.email)
            .await?;
        dispatch(self.delivery.as_ref(), DeliveryChannel::Email, OtpContext::ResetPassword, &user.email, &code).await;

        Ok(())
    }

    /// Replaces the password and signs the user out of every device.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AuthError> {
        PasswordService::validate_strength(&request.new_password)?;

        let email = normalize_email(&request.email);
        let Some(mut user) = self.users.find_user_by_email(&email).await? else {
            return Err(AuthError::InvalidOtp);
        };

        let consumed = self
            .otp
            .consume(OtpContext::ResetPassword, IdentifierType::Email, &user.email, &request.code)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidOtp);
        }

        user.password_hash = PasswordService::hash_password(&request.new_password)?;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        let revoked = self.tokens.revoke_all(user.id).await?;
        info!("Password reset for user {}, {} refresh tokens revoked", user.id, revoked);

        Ok(())
    }
}
