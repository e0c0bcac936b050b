use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{StoreError, UniqueKey};
use shared_models::error::AppError;
use shared_models::profile::{DoctorProfile, DoctorStatus};
use shared_models::schedule::{DayOfWeek, DoctorAvailability, DoctorSchedule};
use shared_models::user::User;

// ==============================================================================
// SURVEY & PROFILE
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSurveyRequest {
    pub personal_identity_photo_url: String,
    pub medical_license_url: String,
    pub specialization: String,
    pub license_number: String,
    pub license_expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub status: DoctorStatus,
    pub specialization: String,
    pub license_number: String,
    pub license_expiry_date: Option<NaiveDate>,
    pub personal_identity_photo_url: String,
    pub medical_license_url: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorProfileResponse {
    pub fn from_parts(profile: DoctorProfile, user: &User) -> Self {
        Self {
            id: profile.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            status: profile.status,
            specialization: profile.specialization,
            license_number: profile.license_number,
            license_expiry_date: profile.license_expiry_date,
            personal_identity_photo_url: profile.personal_identity_photo_url,
            medical_license_url: profile.medical_license_url,
            rejection_reason: profile.rejection_reason,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

// ==============================================================================
// AVAILABILITY & SCHEDULES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEntry {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityRequest {
    pub availabilities: Vec<AvailabilityEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSchedulesQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: u32,
    pub is_available: bool,
}

impl From<DoctorAvailability> for AvailabilityResponse {
    fn from(row: DoctorAvailability) -> Self {
        Self {
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            max_bookings: row.max_bookings,
            is_available: row.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub booking_count: u32,
    pub is_available: bool,
}

impl From<DoctorSchedule> for ScheduleResponse {
    fn from(row: DoctorSchedule) -> Self {
        Self {
            id: row.id,
            date: row.date,
            day_of_week: DayOfWeek::of(row.date),
            booking_count: row.booking_count,
            is_available: row.is_available,
        }
    }
}

// ==============================================================================
// ADMIN
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListQuery {
    pub status: Option<DoctorStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectDoctorRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorStatusRequest {
    pub status: DoctorStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Email or phone number must be verified first")]
    NotVerified,

    #[error("A doctor profile already exists for this user")]
    ProfileExists,

    #[error("Cannot change doctor status from {from} to {to}")]
    InvalidStatus { from: &'static str, to: &'static str },

    #[error("{0}")]
    InvalidSurvey(String),

    #[error("{0}")]
    InvalidAvailability(String),

    #[error("{0} appears more than once")]
    DuplicateDay(&'static str),

    #[error("{0}")]
    InvalidRange(String),

    #[error("No schedule exists for {0}")]
    ScheduleNotFound(NaiveDate),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl DoctorError {
    pub fn code(&self) -> &'static str {
        match self {
            DoctorError::NotFound => "Doctor.NotFound",
            DoctorError::UserNotFound => "User.NotFound",
            DoctorError::NotVerified => "User.NotVerified",
            DoctorError::ProfileExists => "Doctor.ProfileExists",
            DoctorError::InvalidStatus { .. } => "Doctor.InvalidStatus",
            DoctorError::InvalidSurvey(_) => "Doctor.InvalidRequest",
            DoctorError::InvalidAvailability(_) => "Schedule.InvalidRequest",
            DoctorError::DuplicateDay(_) => "Schedule.DuplicateDay",
            DoctorError::InvalidRange(_) => "Schedule.InvalidRange",
            DoctorError::ScheduleNotFound(_) => "Schedule.NotFound",
            DoctorError::Store(_) => shared_models::error::INTERNAL_ERROR_CODE,
        }
    }

    pub(crate) fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(UniqueKey::DoctorProfile) => DoctorError::ProfileExists,
            other => DoctorError::Store(other),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        let code = error.code();
        let description = error.to_string();
        match error {
            DoctorError::NotFound | DoctorError::UserNotFound | DoctorError::ScheduleNotFound(_) => {
                AppError::not_found(code, description)
            }
            DoctorError::NotVerified => AppError::forbidden(code, description),
            DoctorError::ProfileExists => AppError::conflict(code, description),
            DoctorError::InvalidStatus { .. }
            | DoctorError::InvalidSurvey(_)
            | DoctorError::InvalidAvailability(_)
            | DoctorError::DuplicateDay(_)
            | DoctorError::InvalidRange(_) => AppError::bad_request(code, description),
            DoctorError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}
