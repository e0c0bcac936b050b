pub mod admin;
pub mod booking;
pub mod directory;

pub use admin::BookingAdminService;
pub use booking::BookingService;
pub use directory::DoctorDirectoryService;
