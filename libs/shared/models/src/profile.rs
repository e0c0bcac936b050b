use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user without a doctor profile row is `IncompleteProfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoctorStatus {
    #[default]
    IncompleteProfile,
    PendingVerification,
    Active,
    Rejected,
    Suspended,
}

impl DoctorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorStatus::IncompleteProfile => "INCOMPLETE_PROFILE",
            DoctorStatus::PendingVerification => "PENDING_VERIFICATION",
            DoctorStatus::Active => "ACTIVE",
            DoctorStatus::Rejected => "REJECTED",
            DoctorStatus::Suspended => "SUSPENDED",
        }
    }

    /// PENDING_VERIFICATION → {ACTIVE | REJECTED}, ACTIVE ⇄ SUSPENDED.
    pub fn can_transition_to(&self, next: DoctorStatus) -> bool {
        matches!(
            (self, next),
            (DoctorStatus::PendingVerification, DoctorStatus::Active)
                | (DoctorStatus::PendingVerification, DoctorStatus::Rejected)
                | (DoctorStatus::Active, DoctorStatus::Suspended)
                | (DoctorStatus::Suspended, DoctorStatus::Active)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    #[default]
    IncompleteProfile,
    Active,
    Suspended,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::IncompleteProfile => "INCOMPLETE_PROFILE",
            PatientStatus::Active => "ACTIVE",
            PatientStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn can_transition_to(&self, next: PatientStatus) -> bool {
        matches!(
            (self, next),
            (PatientStatus::Active, PatientStatus::Suspended)
                | (PatientStatus::Suspended, PatientStatus::Active)
        )
    }
}

/// Keyed by the owning user's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub status: DoctorStatus,
    pub specialization: String,
    pub license_number: String,
    pub license_expiry_date: Option<NaiveDate>,
    pub personal_identity_photo_url: String,
    pub medical_license_url: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Keyed by the owning user's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub status: PatientStatus,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub has_diabetes: bool,
    pub has_pressure_issues: bool,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
