use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ProfileRepository, RefreshTokenRepository, UserRepository};
use shared_models::auth::SessionClaims;
use shared_models::profile::{DoctorStatus, PatientStatus};
use shared_models::user::{RefreshToken, User};
use shared_utils::jwt::{decode_token_allow_expired, sign_token};
use shared_utils::AppState;

use crate::models::{AuthError, AuthResponse};

const REFRESH_TOKEN_BYTES: usize = 64;

/// Mints session token and refresh token pairs.
pub struct TokenService {
    config: Arc<AppConfig>,
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    rng: SystemRandom,
}

impl TokenService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: state.config.clone(),
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
            refresh_tokens: state.repos.refresh_tokens.clone(),
            rng: SystemRandom::new(),
        }
    }

    /// Absent profiles read as `INCOMPLETE_PROFILE`.
    pub async fn profile_statuses(&self, user_id: Uuid) -> Result<(PatientStatus, DoctorStatus), AuthError> {
        let patient_status = self
            .profiles
            .find_patient_profile(user_id)
            .await?
            .map(|p| p.status)
            .unwrap_or_default();
        let doctor_status = self
            .profiles
            .find_doctor_profile(user_id)
            .await?
            .map(|p| p.status)
            .unwrap_or_default();

        Ok((patient_status, doctor_status))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn issue_session(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let (patient_status, doctor_status) = self.profile_statuses(user.id).await?;

        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.config.jwt_expiry_minutes);
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            jti: Uuid::new_v4().to_string(),
            roles: user.roles.clone(),
            email_confirmed: user.email_confirmed,
            phone_number_confirmed: user.phone_number_confirmed,
            patient_status,
            doctor_status,
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = sign_token(&claims, &self.config.jwt_secret)
            .map_err(|e| AuthError::Internal(format!("Failed to sign session token: {}", e)))?;

        let refresh_token = self.generate_refresh_token()?;
        let refresh_token_expires_at = now + Duration::days(self.config.refresh_token_expiry_days);
        self.refresh_tokens
            .insert_refresh_token(&RefreshToken {
                token_hash: hash_refresh_token(&refresh_token),
                user_id: user.id,
                expires_at: refresh_token_expires_at,
                created_at: now,
                revoked_at: None,
            })
            .await?;

        debug!("Issued session {}", claims.jti);

        Ok(AuthResponse {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            token,
            expires_at,
            refresh_token,
            refresh_token_expires_at,
            email_confirmed: user.email_confirmed,
            phone_number_confirmed: user.phone_number_confirmed,
            patient_status,
            doctor_status,
        })
    }

    /// Trades a (possibly expired) session token and a live refresh token for
    /// a new pair. Each refresh token is accepted once.
    #[instrument(skip_all)]
    pub async fn refresh(&self, token: &str, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let user = self.user_from_token(token).await?;
        if user.is_disabled {
            return Err(AuthError::DisabledUser);
        }

        let revoked = self
            .refresh_tokens
            .revoke_refresh_token(user.id, &hash_refresh_token(refresh_token), Utc::now())
            .await?;
        if !revoked {
            return Err(AuthError::InvalidRefreshToken);
        }

        info!("Refreshed session for user {}", user.id);
        self.issue_session(&user).await
    }

    #[instrument(skip_all)]
    pub async fn revoke(&self, token: &str, refresh_token: &str) -> Result<(), AuthError> {
        let user = self.user_from_token(token).await?;

        let revoked = self
            .refresh_tokens
            .revoke_refresh_token(user.id, &hash_refresh_token(refresh_token), Utc::now())
            .await?;
        if !revoked {
            return Err(AuthError::InvalidRefreshToken);
        }

        info!("Revoked refresh token for user {}", user.id);
        Ok(())
    }

    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.refresh_tokens.revoke_all_for_user(user_id, Utc::now()).await?)
    }

    async fn user_from_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = decode_token_allow_expired(token, &self.config).map_err(|e| {
            debug!("Rejected session token: {}", e);
            AuthError::InvalidToken
        })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    fn generate_refresh_token(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::Internal("System random source unavailable".to_string()))?;
        Ok(STANDARD.encode(bytes))
    }
}

/// Digest stored in place of the refresh token.
pub fn hash_refresh_token(refresh_token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(refresh_token.as_bytes()))
}
