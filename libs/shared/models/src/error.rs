use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const INTERNAL_ERROR_CODE: &str = "Server.Internal";

/// HTTP-facing error. Every variant carries a stable dot-namespaced code
/// (`Booking.BookingLimitExceeded`) and a human readable description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Not Found ({code}): {description}")]
    NotFound { code: &'static str, description: String },

    #[error("Conflict ({code}): {description}")]
    Conflict { code: &'static str, description: String },

    #[error("Bad Request ({code}): {description}")]
    BadRequest { code: &'static str, description: String },

    #[error("Unauthorized ({code}): {description}")]
    Unauthorized { code: &'static str, description: String },

    #[error("Forbidden ({code}): {description}")]
    Forbidden { code: &'static str, description: String },

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    pub fn not_found(code: &'static str, description: impl Into<String>) -> Self {
        Self::NotFound { code, description: description.into() }
    }

    pub fn conflict(code: &'static str, description: impl Into<String>) -> Self {
        Self::Conflict { code, description: description.into() }
    }

    pub fn bad_request(code: &'static str, description: impl Into<String>) -> Self {
        Self::BadRequest { code, description: description.into() }
    }

    pub fn unauthorized(code: &'static str, description: impl Into<String>) -> Self {
        Self::Unauthorized { code, description: description.into() }
    }

    pub fn forbidden(code: &'static str, description: impl Into<String>) -> Self {
        Self::Forbidden { code, description: description.into() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::BadRequest { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. } => code,
            AppError::Internal(_) => INTERNAL_ERROR_CODE,
            AppError::ExternalService(_) => "Server.ExternalService",
        }
    }

    /// Text shown to the caller. Internal failures are never echoed back.
    pub fn description(&self) -> &str {
        match self {
            AppError::NotFound { description, .. }
            | AppError::Conflict { description, .. }
            | AppError::BadRequest { description, .. }
            | AppError::Unauthorized { description, .. }
            | AppError::Forbidden { description, .. } => description,
            AppError::Internal(_) => "An unexpected error occurred",
            AppError::ExternalService(_) => "An upstream service failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Request rejected: {}: {}", status, self.code());
        }

        let body = Json(json!({
            "error": self.description(),
            "code": self.code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
