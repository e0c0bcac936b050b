use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use shared_database::{ProfileRepository, UserRepository};
use shared_models::profile::{DoctorProfile, DoctorStatus};
use shared_utils::AppState;

use crate::models::{DoctorError, DoctorProfileResponse};

/// Admin review of doctor profiles.
pub struct DoctorManagementService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl DoctorManagementService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.repos.users.clone(),
            profiles: state.repos.profiles.clone(),
        }
    }

    pub async fn list(&self, status: Option<DoctorStatus>) -> Result<Vec<DoctorProfileResponse>, DoctorError> {
        let profiles = self.profiles.list_doctor_profiles(status).await?;
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
                Some(DoctorProfileResponse::from_parts(profile, user))
            })
            .collect())
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<DoctorProfileResponse, DoctorError> {
        let profile = self.load(doctor_id).await?;
        self.respond(profile).await
    }

    #[instrument(skip(self))]
    pub async fn accept(&self, doctor_id: Uuid) -> Result<DoctorProfileResponse, DoctorError> {
        let mut profile = self.load(doctor_id).await?;
        ensure_transition(profile.status, DoctorStatus::Active, DoctorStatus::PendingVerification)?;

        profile.status = DoctorStatus::Active;
        profile.rejection_reason = None;
        self.save(&mut profile).await?;

        info!("Doctor {} accepted", doctor_id);
        self.respond(profile).await
    }

    #[instrument(skip(self, reason))]
    pub async fn reject(&self, doctor_id: Uuid, reason: String) -> Result<DoctorProfileResponse, DoctorError> {
        if reason.trim().is_empty() {
            return Err(DoctorError::InvalidSurvey("A rejection reason is required".to_string()));
        }

        let mut profile = self.load(doctor_id).await?;
        ensure_transition(profile.status, DoctorStatus::Rejected, DoctorStatus::PendingVerification)?;

        profile.status = DoctorStatus::Rejected;
        profile.rejection_reason = Some(reason.trim().to_string());
        self.save(&mut profile).await?;

        info!("Doctor {} rejected", doctor_id);
        self.respond(profile).await
    }

    /// Only toggles between ACTIVE and SUSPENDED; review outcomes go through
    /// `accept` and `reject`.
    #[instrument(skip(self))]
    pub async fn set_status(&self, doctor_id: Uuid, status: DoctorStatus) -> Result<DoctorProfileResponse, DoctorError> {
        let mut profile = self.load(doctor_id).await?;

        let toggles = matches!(
            (profile.status, status),
            (DoctorStatus::Active, DoctorStatus::Suspended) | (DoctorStatus::Suspended, DoctorStatus::Active)
        );
        if !toggles {
            return Err(DoctorError::InvalidStatus {
                from: profile.status.as_str(),
                to: status.as_str(),
            });
        }

        profile.status = status;
        self.save(&mut profile).await?;

        info!("Doctor {} is now {}", doctor_id, status.as_str());
        self.respond(profile).await
    }

    async fn load(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        self.profiles
            .find_doctor_profile(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    async fn save(&self, profile: &mut DoctorProfile) -> Result<(), DoctorError> {
        profile.updated_at = Utc::now();
        Ok(self.profiles.update_doctor_profile(profile).await?)
    }

    async fn respond(&self, profile: DoctorProfile) -> Result<DoctorProfileResponse, DoctorError> {
        let user = self
            .users
            .find_user_by_id(profile.id)
            .await?
            .ok_or(DoctorError::UserNotFound)?;
        Ok(DoctorProfileResponse::from_parts(profile, &user))
    }
}

fn ensure_transition(current: DoctorStatus, next: DoctorStatus, required: DoctorStatus) -> Result<(), DoctorError> {
    if current == required && current.can_transition_to(next) {
        Ok(())
    } else {
        Err(DoctorError::InvalidStatus {
            from: current.as_str(),
            to: next.as_str(),
        })
    }
}
