use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::schedule::{BookingStatus, DayOfWeek, ScheduledBooking};

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDoctorsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for BookingPageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

pub const MAX_PAGE_SIZE: u64 = 100;

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_schedule_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ScheduledBooking> for BookingResponse {
    fn from(row: ScheduledBooking) -> Self {
        Self {
            id: row.booking.id,
            doctor_id: row.schedule.doctor_id,
            doctor_schedule_id: row.schedule.id,
            date: row.schedule.date,
            day_of_week: DayOfWeek::of(row.schedule.date),
            status: row.booking.status,
            created_at: row.booking.created_at,
        }
    }
}

/// Admin view of one booking with both participants named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPage {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub bookings: Vec<AdminBookingResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub personal_identity_photo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDoctor {
    #[serde(flatten)]
    pub doctor: DoctorSummary,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: u32,
    pub booking_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_bookings: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Available,
    Full,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub booking_count: u32,
    pub max_bookings: u32,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingScreen {
    pub doctor: DoctorSummary,
    pub working_hours: Vec<WorkingHours>,
    pub calendar: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenScheduleResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub booking_count: u32,
    pub max_bookings: u32,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("The doctor does not work on this day")]
    DoctorUnavailable,

    #[error("This day has been closed for bookings")]
    ScheduleUnavailable,

    #[error("No more bookings are accepted for this day")]
    BookingLimitExceeded,

    #[error("Bookings cannot be made for past dates")]
    InvalidDate,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::DoctorUnavailable => "Booking.DoctorUnavailable",
            BookingError::ScheduleUnavailable => "Booking.ScheduleUnavailable",
            BookingError::BookingLimitExceeded => "Booking.BookingLimitExceeded",
            BookingError::InvalidDate => "Booking.InvalidDate",
            BookingError::DoctorNotFound => "Doctor.NotFound",
            BookingError::Store(_) => shared_models::error::INTERNAL_ERROR_CODE,
        }
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        let code = error.code();
        let description = error.to_string();
        match error {
            BookingError::DoctorUnavailable
            | BookingError::ScheduleUnavailable
            | BookingError::BookingLimitExceeded => AppError::conflict(code, description),
            BookingError::InvalidDate => AppError::bad_request(code, description),
            BookingError::DoctorNotFound => AppError::not_found(code, description),
            BookingError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}
