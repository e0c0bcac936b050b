use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{StoreError, UniqueKey};
use shared_models::error::AppError;
use shared_models::profile::{PatientProfile, PatientStatus};
use shared_models::user::{Gender, User};

pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSurveyRequest {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub has_diabetes: bool,
    #[serde(default)]
    pub has_pressure_issues: bool,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub status: PatientStatus,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub has_diabetes: bool,
    pub has_pressure_issues: bool,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PatientProfileResponse {
    pub fn from_parts(profile: PatientProfile, user: &User) -> Self {
        Self {
            id: profile.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            status: profile.status,
            height: profile.height_cm,
            weight: profile.weight_kg,
            has_diabetes: profile.has_diabetes,
            has_pressure_issues: profile.has_pressure_issues,
            blood_type: profile.blood_type,
            allergies: profile.allergies,
            chronic_conditions: profile.chronic_conditions,
            emergency_contact_name: profile.emergency_contact_name,
            emergency_contact_phone: profile.emergency_contact_phone,
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientListQuery {
    pub status: Option<PatientStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientStatusRequest {
    pub status: PatientStatus,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Email or phone number must be verified first")]
    NotVerified,

    #[error("A patient profile already exists for this user")]
    ProfileExists,

    #[error("Cannot change patient status from {from} to {to}")]
    InvalidStatus { from: &'static str, to: &'static str },

    #[error("{0}")]
    InvalidSurvey(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl PatientError {
    pub fn code(&self) -> &'static str {
        match self {
            PatientError::NotFound => "Patient.NotFound",
            PatientError::UserNotFound => "User.NotFound",
            PatientError::NotVerified => "User.NotVerified",
            PatientError::ProfileExists => "Patient.ProfileExists",
            PatientError::InvalidStatus { .. } => "Patient.InvalidStatus",
            PatientError::InvalidSurvey(_) => "Patient.InvalidRequest",
            PatientError::Store(_) => shared_models::error::INTERNAL_ERROR_CODE,
        }
    }

    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(UniqueKey::PatientProfile) => PatientError::ProfileExists,
            other => PatientError::Store(other),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        let code = error.code();
        let description = error.to_string();
        match error {
            PatientError::NotFound | PatientError::UserNotFound => AppError::not_found(code, description),
            PatientError::NotVerified => AppError::forbidden(code, description),
            PatientError::ProfileExists => AppError::conflict(code, description),
            PatientError::InvalidStatus { .. } | PatientError::InvalidSurvey(_) => {
                AppError::bad_request(code, description)
            }
            PatientError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}
