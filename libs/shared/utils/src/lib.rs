pub mod delivery;
pub mod extractor;
pub mod jwt;
pub mod policy;
pub mod realtime;
pub mod state;
pub mod test_utils;

pub use policy::Policy;
pub use state::AppState;
