use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::policy::{enforce_policy, Policy};
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/patient`.
pub fn patient_routes(state: AppState) -> Router {
    let survey_routes = Router::new()
        .route("/survey", post(handlers::submit_survey))
        .route_layer(middleware::from_fn_with_state(Policy::VerifiedUser, enforce_policy));

    let profile_routes = Router::new()
        .route("/profile", get(handlers::get_my_profile))
        .route_layer(middleware::from_fn_with_state(Policy::PatientProfileRequired, enforce_policy));

    Router::new()
        .merge(survey_routes)
        .merge(profile_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin/patients`.
pub fn admin_patient_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_patients))
        .route("/{patient_id}", get(handlers::get_patient))
        .route("/{patient_id}/status", put(handlers::update_patient_status))
        .route_layer(middleware::from_fn_with_state(Policy::Admin, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
