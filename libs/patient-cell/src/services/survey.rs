use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::{ProfileRepository, UserRepository};
use shared_models::profile::{PatientProfile, PatientStatus};
use shared_utils::AppState;

use crate::models::{PatientError, PatientProfileResponse, PatientSurveyRequest, BLOOD_TYPES};

/// Patients need no review: a submitted survey activates the profile.
pub struct PatientSurveyService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl PatientSurveyService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn submit(&self, user_id: Uuid, request: PatientSurveyRequest) -> Result<PatientProfileResponse, PatientError> {
        validate_survey(&request)?;

        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(PatientError::UserNotFound)?;
        if !user.is_verified() {
            return Err(PatientError::NotVerified);
        }

        if self.profiles.find_patient_profile(user_id).await?.is_some() {
            debug!("Patient survey already submitted by {}", user_id);
            return Err(PatientError::ProfileExists);
        }

        let now = Utc::now();
        let profile = PatientProfile {
            id: user_id,
            status: PatientStatus::Active,
            height_cm: request.height,
            weight_kg: request.weight,
            has_diabetes: request.has_diabetes,
            has_pressure_issues: request.has_pressure_issues,
            blood_type: normalize(request.blood_type).map(|b| b.to_uppercase()),
            allergies: normalize(request.allergies),
            chronic_conditions: normalize(request.chronic_conditions),
            emergency_contact_name: normalize(request.emergency_contact_name),
            emergency_contact_phone: normalize(request.emergency_contact_phone),
            created_at: now,
            updated_at: now,
        };
        self.profiles
            .insert_patient_profile(&profile)
            .await
            .map_err(PatientError::from_store)?;

        info!("Patient profile {} activated", user_id);
        Ok(PatientProfileResponse::from_parts(profile, &user))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<PatientProfileResponse, PatientError> {
        let profile = self
            .profiles
            .find_patient_profile(user_id)
            .await?
            .ok_or(PatientError::NotFound)?;
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(PatientError::UserNotFound)?;

        Ok(PatientProfileResponse::from_parts(profile, &user))
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_survey(request: &PatientSurveyRequest) -> Result<(), PatientError> {
    if request.height.is_some_and(|h| !(30.0..=300.0).contains(&h)) {
        return Err(PatientError::InvalidSurvey("Height must be between 30 and 300 cm".to_string()));
    }
    if request.weight.is_some_and(|w| !(1.0..=500.0).contains(&w)) {
        return Err(PatientError::InvalidSurvey("Weight must be between 1 and 500 kg".to_string()));
    }

    if let Some(blood_type) = request.blood_type.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        if !BLOOD_TYPES.contains(&blood_type.to_uppercase().as_str()) {
            return Err(PatientError::InvalidSurvey(format!("Unknown blood type {}", blood_type)));
        }
    }

    Ok(())
}
