use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::profile::{DoctorStatus, PatientStatus};

use crate::extractor::extract_user;

/// Named authorization rules evaluated against session claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    VerifiedUser,
    PatientProfileRequired,
    DoctorProfileRequired,
    ActivePatient,
    ActiveDoctor,
    PendingDoctor,
    Admin,
}

impl Policy {
    pub fn allows(&self, user: &AuthUser) -> bool {
        match self {
            Policy::VerifiedUser => user.is_verified(),
            Policy::PatientProfileRequired => user.patient_status != PatientStatus::IncompleteProfile,
            Policy::DoctorProfileRequired => user.doctor_status != DoctorStatus::IncompleteProfile,
            Policy::ActivePatient => user.patient_status == PatientStatus::Active,
            Policy::ActiveDoctor => user.doctor_status == DoctorStatus::Active,
            Policy::PendingDoctor => user.doctor_status == DoctorStatus::PendingVerification,
            Policy::Admin => user.is_admin(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::VerifiedUser => "VerifiedUser",
            Policy::PatientProfileRequired => "PatientProfileRequired",
            Policy::DoctorProfileRequired => "DoctorProfileRequired",
            Policy::ActivePatient => "ActivePatient",
            Policy::ActiveDoctor => "ActiveDoctor",
            Policy::PendingDoctor => "PendingDoctor",
            Policy::Admin => "Admin",
        }
    }
}

/// Runs after `auth_middleware`; rejects callers the policy does not allow.
pub async fn enforce_policy(
    State(policy): State<Policy>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;

    if !policy.allows(&user) {
        debug!("User {} rejected by policy {}", user.id, policy.name());
        return Err(AppError::forbidden(
            "Auth.Forbidden",
            format!("This action requires the {} policy", policy.name()),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn caller() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "someone@clinic.test".to_string(),
            first_name: "Some".to_string(),
            last_name: "One".to_string(),
            roles: vec![],
            email_confirmed: false,
            phone_number_confirmed: true,
            patient_status: PatientStatus::IncompleteProfile,
            doctor_status: DoctorStatus::PendingVerification,
            token_id: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn phone_confirmation_is_enough_to_be_verified() {
        assert!(Policy::VerifiedUser.allows(&caller()));
    }

    #[test]
    fn pending_doctor_is_not_active() {
        let user = caller();
        assert!(Policy::DoctorProfileRequired.allows(&user));
        assert!(Policy::PendingDoctor.allows(&user));
        assert!(!Policy::ActiveDoctor.allows(&user));
        assert!(!Policy::PatientProfileRequired.allows(&user));
    }

    #[test]
    fn admin_requires_role() {
        let mut user = caller();
        assert!(!Policy::Admin.allows(&user));
        user.roles.push("SuperAdmin".to_string());
        assert!(Policy::Admin.allows(&user));
    }
}
