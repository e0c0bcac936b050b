use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{AvailableDoctorsQuery, BookRequest, BookingPageQuery, BookingResponse};
use crate::services::{BookingAdminService, BookingService, DoctorDirectoryService};

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Patient {} booking {} on {}", user.id, request.doctor_id, request.date);

    let booked = BookingService::new(&state)
        .book(user.id, request.doctor_id, request.date)
        .await?;

    Ok(Json(json!({
        "bookingId": booked.booking.id,
        "booking": BookingResponse::from(booked)
    })))
}

#[axum::debug_handler]
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let rows = BookingService::new(&state).my_bookings(user.id).await?;

    let bookings: Vec<BookingResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!(bookings)))
}

#[axum::debug_handler]
pub async fn available_doctors(
    State(state): State<AppState>,
    Query(query): Query<AvailableDoctorsQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorDirectoryService::new(&state)
        .available_doctors(query.date)
        .await?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn booking_screen(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let screen = DoctorDirectoryService::new(&state).booking_screen(doctor_id).await?;

    Ok(Json(json!(screen)))
}

#[axum::debug_handler]
pub async fn open_schedules(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedules = DoctorDirectoryService::new(&state).open_schedules(doctor_id).await?;

    Ok(Json(json!(schedules)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingPageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = BookingAdminService::new(&state)
        .list(query.page, query.page_size)
        .await?;

    Ok(Json(json!(page)))
}
