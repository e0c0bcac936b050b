use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use auth_cell::{admin_user_routes, auth_routes};
use booking_cell::{admin_booking_routes, booking_routes};
use chat_cell::{admin_chat_routes, doctor_chat_routes, live_chat_routes, patient_chat_routes};
use doctor_cell::{admin_doctor_routes, doctor_routes, schedule_routes};
use patient_cell::{admin_patient_routes, patient_routes};
use shared_utils::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctor/chat", doctor_chat_routes(state.clone()))
        .nest("/doctor", doctor_routes(state.clone()))
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/patient/chat", patient_chat_routes(state.clone()))
        .nest("/patient", patient_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/chat", live_chat_routes(state.clone()))
        .nest("/admin", admin_user_routes(state.clone()))
        .nest("/admin/doctors", admin_doctor_routes(state.clone()))
        .nest("/admin/patients", admin_patient_routes(state.clone()))
        .nest("/admin/bookings", admin_booking_routes(state.clone()))
        .nest("/admin/chat", admin_chat_routes(state))
}
