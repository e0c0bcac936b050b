use thiserror::Error;

/// Unique constraints the stores enforce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    Email,
    PhoneNumber,
    DoctorProfile,
    PatientProfile,
    Conversation,
    Other(String),
}

impl UniqueKey {
    /// Maps a Postgres constraint name (as named in the migration) to a key.
    pub fn from_constraint(name: &str) -> Self {
        match name {
            "users_email_key" => UniqueKey::Email,
            "users_phone_number_key" => UniqueKey::PhoneNumber,
            "doctor_profiles_pkey" => UniqueKey::DoctorProfile,
            "patient_profiles_pkey" => UniqueKey::PatientProfile,
            "conversations_pair_key" => UniqueKey::Conversation,
            other => UniqueKey::Other(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate value for unique key {0:?}")]
    Duplicate(UniqueKey),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Redis connection error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
