use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::policy::{enforce_policy, Policy};
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/bookings`. Every route needs an active patient.
pub fn booking_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::book))
        .route("/me", get(handlers::my_bookings))
        .route("/doctors", get(handlers::available_doctors))
        .route("/doctors/{doctor_id}", get(handlers::booking_screen))
        .route("/doctors/{doctor_id}/schedules", get(handlers::open_schedules))
        .route_layer(middleware::from_fn_with_state(Policy::ActivePatient, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin/bookings`.
pub fn admin_booking_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_bookings))
        .route_layer(middleware::from_fn_with_state(Policy::Admin, enforce_policy))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
