use std::sync::{Arc, OnceLock};

use chrono::{Months, NaiveDate, Utc};
use regex::Regex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::UserRepository;
use shared_models::user::{normalize_email, User};
use shared_utils::AppState;

use crate::models::{AuthError, RegisterRequest};
use crate::services::password::PasswordService;

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 100;
const MIN_AGE_YEARS: u32 = 13;

fn matches(pattern: &OnceLock<Option<Regex>>, source: &str, value: &str) -> bool {
    pattern
        .get_or_init(|| Regex::new(source).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email)
}

pub fn is_valid_phone(phone_number: &str) -> bool {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    matches(&PHONE, r"^\+?[0-9]{7,15}$", phone_number)
}

/// Creates the bare identity record. No profile is created here; doctors and
/// patients complete theirs through the survey endpoints.
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
}

impl RegistrationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Uuid, AuthError> {
        Self::validate(&request, Utc::now().date_naive())?;

        let email = normalize_email(&request.email);
        let phone_number = request
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        if self.users.find_user_by_email(&email).await?.is_some() {
            debug!("Registration rejected, email already taken");
            return Err(AuthError::EmailDuplicated);
        }
        if let Some(phone) = &phone_number {
            if self.users.find_user_by_phone(phone).await?.is_some() {
                debug!("Registration rejected, phone already taken");
                return Err(AuthError::PhoneDuplicated);
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            phone_number,
            password_hash: PasswordService::hash_password(&request.password)?,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            email_confirmed: false,
            phone_number_confirmed: false,
            is_disabled: false,
            roles: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // The store's unique keys still catch a racing registration.
        self.users.insert_user(&user).await.map_err(AuthError::from_store)?;

        info!("Registered user {}", user.id);
        Ok(user.id)
    }

    /// Reports the first failing rule.
    pub fn validate(request: &RegisterRequest, today: NaiveDate) -> Result<(), AuthError> {
        if !is_valid_email(request.email.trim()) {
            return Err(AuthError::Validation("Email address is not valid".to_string()));
        }

        PasswordService::validate_strength(&request.password)?;

        for (field, value) in [("First name", &request.first_name), ("Last name", &request.last_name)] {
            let length = value.trim().chars().count();
            if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
                return Err(AuthError::Validation(format!(
                    "{} must be between {} and {} characters",
                    field, MIN_NAME_LENGTH, MAX_NAME_LENGTH
                )));
            }
        }

        let latest_birth_date = today
            .checked_sub_months(Months::new(MIN_AGE_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        if request.date_of_birth > latest_birth_date {
            return Err(AuthError::Validation(format!(
                "User must be at least {} years old",
                MIN_AGE_YEARS
            )));
        }

        if let Some(phone) = request.phone_number.as_deref().map(str::trim) {
            if !phone.is_empty() && !is_valid_phone(phone) {
                return Err(AuthError::Validation("Phone number is not valid".to_string()));
            }
        }

        Ok(())
    }
}
