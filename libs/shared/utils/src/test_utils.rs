use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use shared_config::{AppConfig, OtpCodePolicy, StorageBackend};
use shared_database::{MemoryDatabase, MemoryOtpCache, Repositories};
use shared_models::auth::{roles, AuthUser, SessionClaims};
use shared_models::profile::{DoctorProfile, DoctorStatus, PatientProfile, PatientStatus};
use shared_models::user::{Gender, User};

use crate::delivery::{DeliveryChannel, OtpDelivery};
use crate::jwt::sign_token;
use crate::state::AppState;

pub const TEST_OTP_CODE: &str = "12345";

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub otp_policy: OtpCodePolicy,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            otp_policy: OtpCodePolicy::Fixed(TEST_OTP_CODE.to_string()),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            jwt_issuer: "clinic-api".to_string(),
            jwt_audience: "clinic-clients".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_expiry_days: 14,
            otp_policy: self.otp_policy.clone(),
            otp_ttl_minutes: 10,
            storage_backend: StorageBackend::Memory,
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            redis_url: None,
            booking_calendar_days: 7,
            schedule_generation_max_days: 366,
            request_timeout_seconds: 30,
            server_addr: "127.0.0.1:0".to_string(),
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Records every delivered code so tests can read them back.
#[derive(Default, Clone)]
pub struct RecordingOtpDelivery {
    pub sent: Arc<Mutex<Vec<(DeliveryChannel, String, String)>>>,
}

impl RecordingOtpDelivery {
    pub async fn last_code_for(&self, destination: &str) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.iter()
            .rev()
            .find(|(_, to, _)| to == destination)
            .map(|(_, _, code)| code.clone())
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl OtpDelivery for RecordingOtpDelivery {
    async fn deliver(
        &self,
        channel: DeliveryChannel,
        destination: &str,
        _purpose: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .await
            .push((channel, destination.to_string(), code.to_string()));
        Ok(())
    }
}

/// In-memory state plus the recorder behind its OTP delivery.
pub fn test_state(config: &TestConfig) -> (AppState, RecordingOtpDelivery) {
    let delivery = RecordingOtpDelivery::default();
    let state = AppState::new(
        config.to_app_config(),
        Repositories::from_store(Arc::new(MemoryDatabase::new())),
        Arc::new(MemoryOtpCache::new()),
        Arc::new(delivery.clone()),
    );
    (state, delivery)
}

#[derive(Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub email_confirmed: bool,
    pub patient_status: PatientStatus,
    pub doctor_status: DoctorStatus,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            roles: vec![],
            email_confirmed: true,
            patient_status: PatientStatus::IncompleteProfile,
            doctor_status: DoctorStatus::IncompleteProfile,
        }
    }
}

impl TestUser {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self {
            doctor_status: DoctorStatus::Active,
            ..Self::new(email)
        }
    }

    pub fn patient(email: &str) -> Self {
        Self {
            patient_status: PatientStatus::Active,
            ..Self::new(email)
        }
    }

    pub fn admin(email: &str) -> Self {
        Self {
            roles: vec![roles::ADMIN.to_string()],
            ..Self::new(email)
        }
    }

    pub fn unverified(email: &str) -> Self {
        Self {
            email_confirmed: false,
            ..Self::new(email)
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.clone(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            roles: self.roles.clone(),
            email_confirmed: self.email_confirmed,
            phone_number_confirmed: false,
            patient_status: self.patient_status,
            doctor_status: self.doctor_status,
            token_id: Uuid::new_v4().to_string(),
        }
    }

    /// Stored identity record for this user. The password hash is a
    /// placeholder, so it cannot log in with a password.
    pub fn to_user(&self) -> User {
        let now = Utc::now();
        User {
            id: self.id,
            email: self.email.clone(),
            phone_number: None,
            password_hash: "unusable".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            gender: Gender::Other,
            email_confirmed: self.email_confirmed,
            phone_number_confirmed: false,
            is_disabled: false,
            roles: self.roles.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_claims(&self, config: &AppConfig, exp_hours: i64) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: self.id.to_string(),
            email: self.email.clone(),
            given_name: "Test".to_string(),
            family_name: "User".to_string(),
            jti: Uuid::new_v4().to_string(),
            roles: self.roles.clone(),
            email_confirmed: self.email_confirmed,
            phone_number_confirmed: false,
            patient_status: self.patient_status,
            doctor_status: self.doctor_status,
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(exp_hours)).timestamp(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, config: &AppConfig, exp_hours: Option<i64>) -> String {
        let claims = user.to_claims(config, exp_hours.unwrap_or(24));
        sign_token(&claims, &config.jwt_secret).expect("test token should sign")
    }

    pub fn create_expired_token(user: &TestUser, config: &AppConfig) -> String {
        Self::create_test_token(user, config, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser, config: &AppConfig) -> String {
        let claims = user.to_claims(config, 24);
        sign_token(&claims, "wrong-secret").expect("test token should sign")
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

pub fn doctor_profile(id: Uuid, status: DoctorStatus) -> DoctorProfile {
    let now = Utc::now();
    DoctorProfile {
        id,
        status,
        specialization: "Cardiology".to_string(),
        license_number: "LIC-0001".to_string(),
        license_expiry_date: None,
        personal_identity_photo_url: "https://files.test/id.png".to_string(),
        medical_license_url: "https://files.test/license.pdf".to_string(),
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn patient_profile(id: Uuid, status: PatientStatus) -> PatientProfile {
    let now = Utc::now();
    PatientProfile {
        id,
        status,
        height_cm: Some(170.0),
        weight_kg: Some(70.0),
        has_diabetes: false,
        has_pressure_issues: false,
        blood_type: None,
        allergies: None,
        chronic_conditions: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        created_at: now,
        updated_at: now,
    }
}
