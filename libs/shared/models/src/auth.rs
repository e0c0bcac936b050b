use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::{DoctorStatus, PatientStatus};

pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const SUPER_ADMIN: &str = "SuperAdmin";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub jti: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub email_confirmed: bool,
    pub phone_number_confirmed: bool,
    pub patient_status: PatientStatus,
    pub doctor_status: DoctorStatus,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    pub email_confirmed: bool,
    pub phone_number_confirmed: bool,
    pub patient_status: PatientStatus,
    pub doctor_status: DoctorStatus,
    pub token_id: String,
}

impl AuthUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_verified(&self) -> bool {
        self.email_confirmed || self.phone_number_confirmed
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(roles::ADMIN) || self.has_role(roles::SUPER_ADMIN)
    }
}

impl TryFrom<SessionClaims> for AuthUser {
    type Error = uuid::Error;

    fn try_from(claims: SessionClaims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&claims.sub)?,
            email: claims.email,
            first_name: claims.given_name,
            last_name: claims.family_name,
            roles: claims.roles,
            email_confirmed: claims.email_confirmed,
            phone_number_confirmed: claims.phone_number_confirmed,
            patient_status: claims.patient_status,
            doctor_status: claims.doctor_status,
            token_id: claims.jti,
        })
    }
}
