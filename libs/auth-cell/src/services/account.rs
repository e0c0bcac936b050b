use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_database::UserRepository;
use shared_models::auth::roles;
use shared_models::user::{normalize_email, Gender, User};
use shared_utils::AppState;

use crate::models::{AccountResponse, AuthError};
use crate::services::password::PasswordService;
use crate::services::token::TokenService;

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            tokens: TokenService::new(state),
        }
    }

    /// Profile statuses come from the store, not from the caller's claims.
    pub async fn me(&self, user_id: Uuid) -> Result<AccountResponse, AuthError> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let (patient_status, doctor_status) = self.tokens.profile_statuses(user.id).await?;

        Ok(AccountResponse {
            id: user.id,
            email: user.email,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            email_confirmed: user.email_confirmed,
            phone_number_confirmed: user.phone_number_confirmed,
            roles: user.roles,
            patient_status,
            doctor_status,
        })
    }

    /// Soft-disable only. Disabling also revokes every refresh token.
    #[instrument(skip(self))]
    pub async fn set_disabled(&self, user_id: Uuid, disabled: bool) -> Result<(), AuthError> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.is_disabled = disabled;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        if disabled {
            self.tokens.revoke_all(user.id).await?;
        }

        info!("User {} disabled = {}", user.id, disabled);
        Ok(())
    }

    /// Makes sure an admin account exists for `email`. Returns true when a
    /// new account was created.
    #[instrument(skip(self, password))]
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        let email = normalize_email(email);

        if let Some(mut user) = self.users.find_user_by_email(&email).await? {
            if !user.roles.iter().any(|r| r == roles::ADMIN) {
                warn!("Promoting existing user {} to admin", user.id);
                user.roles.push(roles::ADMIN.to_string());
                user.updated_at = Utc::now();
                self.users.update_user(&user).await?;
            }
            return Ok(false);
        }

        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            email,
            phone_number: None,
            password_hash: PasswordService::hash_password(password)?,
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
            gender: Gender::Other,
            email_confirmed: true,
            phone_number_confirmed: false,
            is_disabled: false,
            roles: vec![roles::ADMIN.to_string()],
            created_at: now,
            updated_at: now,
        };
        self.users.insert_user(&admin).await.map_err(AuthError::from_store)?;

        info!("Seeded admin account {}", admin.id);
        Ok(true)
    }
}
