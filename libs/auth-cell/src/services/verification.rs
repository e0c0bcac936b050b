use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use shared_database::UserRepository;
use shared_models::user::{normalize_email, User};
use shared_utils::delivery::{DeliveryChannel, OtpDelivery};
use shared_utils::AppState;

use crate::models::{AuthError, IdentifierType, OtpContext};
use crate::services::otp::OtpService;

/// Email and phone confirmation through one-time codes.
pub struct VerificationService {
    users: Arc<dyn UserRepository>,
    otp: OtpService,
    delivery: Arc<dyn OtpDelivery>,
}

impl VerificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            otp: OtpService::new(state),
            delivery: state.otp_delivery.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn send_email_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let user = self.find_by_email(&email).await?;
        if user.email_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        let code = self
            .otp
            .issue(OtpContext::Verification, IdentifierType::Email, &user.email)
            .await?;
        dispatch(self.delivery.as_ref(), DeliveryChannel::Email, OtpContext::Verification, &user.email, &code).await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn send_phone_otp(&self, phone_number: &str) -> Result<(), AuthError> {
        let phone_number = phone_number.trim();
        let user = self.find_by_phone(phone_number).await?;
        if user.phone_number_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        let code = self
            .otp
            .issue(OtpContext::Verification, IdentifierType::Phone, phone_number)
            .await?;
        dispatch(self.delivery.as_ref(), DeliveryChannel::Sms, OtpContext::Verification, phone_number, &code).await;

        Ok(())
    }

    #[instrument(skip(self, code))]
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let mut user = self.find_by_email(&email).await?;
        if user.email_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        let consumed = self
            .otp
            .consume(OtpContext::Verification, IdentifierType::Email, &user.email, code)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidOtp);
        }

        user.email_confirmed = true;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!("Email confirmed for user {}", user.id);
        Ok(())
    }

    #[instrument(skip(self, code))]
    pub async fn verify_phone(&self, phone_number: &str, code: &str) -> Result<(), AuthError> {
        let phone_number = phone_number.trim();
        let mut user = self.find_by_phone(phone_number).await?;
        if user.phone_number_confirmed {
            return Err(AuthError::AlreadyVerified);
        }

        let consumed = self
            .otp
            .consume(OtpContext::Verification, IdentifierType::Phone, phone_number, code)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidOtp);
        }

        user.phone_number_confirmed = true;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!("Phone number confirmed for user {}", user.id);
        Ok(())
    }

    /// Issues a login code only for users who could log in with it. The
    /// caller sees the same outcome either way.
    #[instrument(skip(self))]
    pub async fn send_login_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        match self.users.find_user_by_email(&email).await? {
            Some(user) if user.is_verified() && !user.is_disabled => {
                let code = self
                    .otp
                    .issue(OtpContext::Login, IdentifierType::Email, &user.email)
                    .await?;
                dispatch(self.delivery.as_ref(), DeliveryChannel::Email, OtpContext::Login, &user.email, &code).await;
            }
            _ => info!("Login code not issued"),
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.users
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<User, AuthError> {
        self.users
            .find_user_by_phone(phone_number)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Delivery failures are logged, not surfaced; the client can ask again.
pub(crate) async fn dispatch(
    delivery: &dyn OtpDelivery,
    channel: DeliveryChannel,
    context: OtpContext,
    destination: &str,
    code: &str,
) {
    if let Err(e) = delivery.deliver(channel, destination, context.as_str(), code).await {
        warn!("Failed to deliver code to {}: {}", destination, e);
    }
}
