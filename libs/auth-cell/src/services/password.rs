use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use tracing::instrument;

use crate::models::AuthError;

const MIN_PASSWORD_LENGTH: usize = 8;
const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~`'\"\\";

pub struct PasswordService;

impl PasswordService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// A stored hash that does not parse counts as a mismatch.
    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Collects every broken rule so the client can show them together.
    pub fn validate_strength(password: &str) -> Result<(), AuthError> {
        let mut issues = Vec::new();

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            issues.push(format!("at least {} characters", MIN_PASSWORD_LENGTH));
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            issues.push("a lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            issues.push("an uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            issues.push("a digit".to_string());
        }
        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            issues.push("a special character".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(format!(
                "Password must contain {}",
                issues.join(", ")
            )))
        }
    }
}
