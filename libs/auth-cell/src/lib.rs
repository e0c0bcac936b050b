pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::AuthError;
pub use router::{admin_user_routes, auth_routes};
