pub mod management;
pub mod survey;

pub use management::PatientManagementService;
pub use survey::PatientSurveyService;
