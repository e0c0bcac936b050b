pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::DoctorError;
pub use router::{admin_doctor_routes, doctor_routes, schedule_routes};
