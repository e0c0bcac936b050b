use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AvailabilityResponse, DoctorListQuery, DoctorSurveyRequest, GenerateSchedulesQuery,
    RejectDoctorRequest, ScheduleRangeQuery, ScheduleResponse, SetAvailabilityRequest,
    UpdateDoctorStatusRequest, UpdateScheduleRequest,
};
use crate::services::{DoctorManagementService, DoctorSurveyService, ScheduleService};

// ==============================================================================
// DOCTOR PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn submit_survey(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DoctorSurveyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorSurveyService::new(&state);

    let profile = service.submit(user.id, request).await?;

    Ok(Json(json!({
        "message": "Survey submitted. Your profile is pending verification.",
        "profile": profile
    })))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let profile = DoctorSurveyService::new(&state).get_profile(user.id).await?;

    Ok(Json(json!(profile)))
}

// ==============================================================================
// SCHEDULE HANDLERS (ACTIVE DOCTORS)
// ==============================================================================

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let rows = ScheduleService::new(&state)
        .set_availability(user.id, request)
        .await?;

    let availabilities: Vec<AvailabilityResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "availabilities": availabilities })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let rows = ScheduleService::new(&state).get_availability(user.id).await?;

    let availabilities: Vec<AvailabilityResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "availabilities": availabilities })))
}

#[axum::debug_handler]
pub async fn generate_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GenerateSchedulesQuery>,
) -> Result<Json<Value>, AppError> {
    debug!("Generating schedules {}..{} for {}", query.start_date, query.end_date, user.id);

    let created = ScheduleService::new(&state)
        .generate_schedules(user.id, query.start_date, query.end_date)
        .await?;

    let schedules: Vec<ScheduleResponse> = created.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "created": schedules.len(),
        "schedules": schedules
    })))
}

#[axum::debug_handler]
pub async fn get_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ScheduleRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let rows = ScheduleService::new(&state)
        .get_schedules(user.id, query.from, query.to)
        .await?;

    let schedules: Vec<ScheduleResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(json!(schedules)))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule = ScheduleService::new(&state)
        .set_schedule_availability(user.id, date, request.is_available)
        .await?;

    Ok(Json(json!(ScheduleResponse::from(schedule))))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorManagementService::new(&state).list(query.status).await?;

    Ok(Json(json!({
        "total": doctors.len(),
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorManagementService::new(&state).get(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn accept_doctor(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {} accepting doctor {}", admin.id, doctor_id);

    let doctor = DoctorManagementService::new(&state).accept(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn reject_doctor(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<RejectDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {} rejecting doctor {}", admin.id, doctor_id);

    let doctor = DoctorManagementService::new(&state)
        .reject(doctor_id, request.reason)
        .await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {} setting doctor {} to {}", admin.id, doctor_id, request.status.as_str());

    let doctor = DoctorManagementService::new(&state)
        .set_status(doctor_id, request.status)
        .await?;

    Ok(Json(json!(doctor)))
}
