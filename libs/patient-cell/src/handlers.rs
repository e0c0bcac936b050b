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

use crate::models::{PatientListQuery, PatientSurveyRequest, UpdatePatientStatusRequest};
use crate::services::{PatientManagementService, PatientSurveyService};

#[axum::debug_handler]
pub async fn submit_survey(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PatientSurveyRequest>,
) -> Result<Json<Value>, AppError> {
    let profile = PatientSurveyService::new(&state).submit(user.id, request).await?;

    Ok(Json(json!({
        "message": "Survey submitted. Your patient profile is active.",
        "profile": profile
    })))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let profile = PatientSurveyService::new(&state).get_profile(user.id).await?;

    Ok(Json(json!(profile)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = PatientManagementService::new(&state).list(query.status).await?;

    Ok(Json(json!({
        "total": patients.len(),
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientManagementService::new(&state).get(patient_id).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient_status(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientStatusRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Admin {} setting patient {} to {}", admin.id, patient_id, request.status.as_str());

    let patient = PatientManagementService::new(&state)
        .set_status(patient_id, request.status)
        .await?;

    Ok(Json(json!(patient)))
}
