use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use shared_database::{ProfileRepository, UserRepository};
use shared_models::profile::PatientStatus;
use shared_utils::AppState;

use crate::models::{PatientError, PatientProfileResponse};

pub struct PatientManagementService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl PatientManagementService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
        }
    }

    pub async fn list(&self, status: Option<PatientStatus>) -> Result<Vec<PatientProfileResponse>, PatientError> {
        let profiles = self.profiles.list_patient_profiles(status).await?;
        let ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let users: HashMap<Uuid, _> = self
            .users
            .find_users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(profiles
            .into_iter()
            .filter_map(|profile| {
                let user = users.get(&profile.id)?;
                Some(PatientProfileResponse::from_parts(profile, user))
            })
            .collect())
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<PatientProfileResponse, PatientError> {
        let profile = self
            .profiles
            .find_patient_profile(patient_id)
            .await?
            .ok_or(PatientError::NotFound)?;
        let user = self
            .users
            .find_user_by_id(patient_id)
            .await?
            .ok_or(PatientError::UserNotFound)?;

        Ok(PatientProfileResponse::from_parts(profile, &user))
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, patient_id: Uuid, status: PatientStatus) -> Result<PatientProfileResponse, PatientError> {
        let mut profile = self
            .profiles
            .find_patient_profile(patient_id)
            .await?
            .ok_or(PatientError::NotFound)?;

        if !profile.status.can_transition_to(status) {
            return Err(PatientError::InvalidStatus {
                from: profile.status.as_str(),
                to: status.as_str(),
            });
        }

        profile.status = status;
        profile.updated_at = Utc::now();
        self.profiles.update_patient_profile(&profile).await?;

        info!("Patient {} is now {}", patient_id, status.as_str());
        self.get(patient_id).await
    }
}
