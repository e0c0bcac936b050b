use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::policy::{enforce_policy, Policy};
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/doctor`.
pub fn doctor_routes(state: AppState) -> Router {
    let survey_routes = Router::new()
        .route("/survey", post(handlers::submit_survey))
        .route_layer(middleware::from_fn_with_state(Policy::VerifiedUser, enforce_policy));

    let profile_routes = Router::new()
        .route("/profile", get(handlers::get_my_profile))
        .route_layer(middleware::from_fn_with_state(Policy::DoctorProfileRequired, enforce_policy));

    Router::new()
        .merge(survey_routes)
        .merge(profile_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/schedules`.
pub fn schedule_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::get_schedules))
        .route("/availability", get(handlers::get_availability).post(handlers::set_availability))
        .route("/generate", post(handlers::generate_schedules))
        .route("/{date}", patch(handlers::update_schedule))
        .route_layer(middleware::from_fn_with_state(Policy::ActiveDoctor, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin/doctors`.
pub fn admin_doctor_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/accept", post(handlers::accept_doctor))
        .route("/{doctor_id}/reject", post(handlers::reject_doctor))
        .route("/{doctor_id}/status", put(handlers::update_doctor_status))
        .route_layer(middleware::from_fn_with_state(Policy::Admin, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
