use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{JwtHeader, SessionClaims};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("JWT secret is not set")]
    MissingSecret,
    #[error("Invalid token format")]
    Malformed,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Invalid claims format")]
    InvalidClaims,
    #[error("Token expired")]
    Expired,
    #[error("Unexpected issuer or audience")]
    WrongAudience,
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

fn mac(secret: &str) -> Result<HmacSha256, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| JwtError::Encoding(e.to_string()))
}

/// Signs `claims` as an HS256 JWT.
pub fn sign_token(claims: &SessionClaims, secret: &str) -> Result<String, JwtError> {
    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_vec(&header).map_err(|e| JwtError::Encoding(e.to_string()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| JwtError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let mut mac = mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Verifies signature, issuer, audience and expiry.
pub fn validate_token(token: &str, config: &AppConfig) -> Result<SessionClaims, JwtError> {
    let claims = decode_token_allow_expired(token, config)?;

    let now = Utc::now().timestamp();
    if claims.exp <= now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err(JwtError::Expired);
    }

    Ok(claims)
}

/// Verifies signature, issuer and audience but accepts an expired token.
/// Used when exchanging a refresh token.
pub fn decode_token_allow_expired(token: &str, config: &AppConfig) -> Result<SessionClaims, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::Malformed);
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature = URL_SAFE_NO_PAD.decode(parts[2]).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        JwtError::Malformed
    })?;

    let header: JwtHeader = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(JwtError::Malformed)?;
    if header.alg != "HS256" {
        debug!("Rejected token with alg {}", header.alg);
        return Err(JwtError::InvalidSignature);
    }

    let mut mac = mac(&config.jwt_secret)?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(JwtError::InvalidSignature);
    }

    let claims_json = URL_SAFE_NO_PAD.decode(claims_b64).map_err(|_| JwtError::InvalidClaims)?;
    let claims: SessionClaims = serde_json::from_slice(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        JwtError::InvalidClaims
    })?;

    if claims.iss != config.jwt_issuer || claims.aud != config.jwt_audience {
        return Err(JwtError::WrongAudience);
    }

    debug!("Token validated successfully for user: {}", claims.sub);
    Ok(claims)
}
