use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::{ProfileRepository, UserRepository};
use shared_models::profile::{DoctorProfile, DoctorStatus};
use shared_utils::AppState;

use crate::models::{DoctorError, DoctorProfileResponse, DoctorSurveyRequest};

/// Turns a verified identity into a doctor awaiting admin review.
pub struct DoctorSurveyService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl DoctorSurveyService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn submit(&self, user_id: Uuid, request: DoctorSurveyRequest) -> Result<DoctorProfileResponse, DoctorError> {
        validate_survey(&request)?;

        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(DoctorError::UserNotFound)?;
        if !user.is_verified() {
            return Err(DoctorError::NotVerified);
        }

        if self.profiles.find_doctor_profile(user_id).await?.is_some() {
            debug!("Doctor survey already submitted by {}", user_id);
            return Err(DoctorError::ProfileExists);
        }

        let now = Utc::now();
        let profile = DoctorProfile {
            id: user_id,
            status: DoctorStatus::PendingVerification,
            specialization: request.specialization.trim().to_string(),
            license_number: request.license_number.trim().to_string(),
            license_expiry_date: request.license_expiry_date,
            personal_identity_photo_url: request.personal_identity_photo_url.trim().to_string(),
            medical_license_url: request.medical_license_url.trim().to_string(),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.profiles
            .insert_doctor_profile(&profile)
            .await
            .map_err(DoctorError::from_store)?;

        info!("Doctor profile {} submitted for verification", user_id);
        Ok(DoctorProfileResponse::from_parts(profile, &user))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<DoctorProfileResponse, DoctorError> {
        let profile = self
            .profiles
            .find_doctor_profile(user_id)
            .await?
            .ok_or(DoctorError::NotFound)?;
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(DoctorError::UserNotFound)?;

        Ok(DoctorProfileResponse::from_parts(profile, &user))
    }
}

fn validate_survey(request: &DoctorSurveyRequest) -> Result<(), DoctorError> {
    let required = [
        ("Personal identity photo", &request.personal_identity_photo_url),
        ("Medical license", &request.medical_license_url),
        ("Specialization", &request.specialization),
        ("License number", &request.license_number),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(DoctorError::InvalidSurvey(format!("{} is required", field)));
    }

    if let Some(expiry) = request.license_expiry_date {
        if expiry <= Utc::now().date_naive() {
            return Err(DoctorError::InvalidSurvey("Medical license has expired".to_string()));
        }
    }

    Ok(())
}
