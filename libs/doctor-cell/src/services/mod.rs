pub mod management;
pub mod schedule;
pub mod survey;

pub use management::DoctorManagementService;
pub use schedule::ScheduleService;
pub use survey::DoctorSurveyService;
