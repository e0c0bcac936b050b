pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::BookingError;
pub use router::{admin_booking_routes, booking_routes};
