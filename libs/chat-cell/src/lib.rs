pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::ChatError;
pub use router::{admin_chat_routes, doctor_chat_routes, live_chat_routes, patient_chat_routes};
