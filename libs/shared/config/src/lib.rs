use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// How one-time codes are produced.
///
/// `Fixed` exists for local and test deployments where a predictable code is
/// needed; production deployments leave `OTP_FIXED_CODE` unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpCodePolicy {
    Random { digits: u32 },
    Fixed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub otp_policy: OtpCodePolicy,
    pub otp_ttl_minutes: u64,
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub redis_url: Option<String>,
    pub booking_calendar_days: u32,
    pub schedule_generation_max_days: i64,
    pub request_timeout_seconds: u64,
    pub server_addr: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

const DEFAULT_OTP_DIGITS: u32 = 5;

impl AppConfig {
    pub fn from_env() -> Self {
        let otp_policy = match env::var("OTP_FIXED_CODE") {
            Ok(code) if !code.trim().is_empty() => {
                warn!("OTP_FIXED_CODE is set, one-time codes are predictable");
                OtpCodePolicy::Fixed(code.trim().to_string())
            }
            _ => {
                let digits: u32 = parse_or("OTP_LENGTH", DEFAULT_OTP_DIGITS);
                let digits = if (4..=8).contains(&digits) {
                    digits
                } else {
                    warn!("OTP_LENGTH {} outside 4..=8, using {}", digits, DEFAULT_OTP_DIGITS);
                    DEFAULT_OTP_DIGITS
                };
                OtpCodePolicy::Random { digits }
            }
        };

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "supabase" | "postgrest" => StorageBackend::Supabase,
            "memory" => StorageBackend::Memory,
            other => {
                warn!("Unknown STORAGE_BACKEND '{}', using in-memory storage", other);
                StorageBackend::Memory
            }
        };

        let config = Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using empty value");
                String::new()
            }),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "clinic-api".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "clinic-clients".to_string()),
            jwt_expiry_minutes: parse_or("JWT_EXPIRY_MINUTES", 60),
            refresh_token_expiry_days: parse_or("REFRESH_TOKEN_EXPIRY_DAYS", 14),
            otp_policy,
            otp_ttl_minutes: parse_or("OTP_TTL_MINUTES", 10),
            storage_backend,
            supabase_url: env::var("SUPABASE_URL").unwrap_or_else(|_| {
                if storage_backend == StorageBackend::Supabase {
                    warn!("SUPABASE_URL not set, using empty value");
                }
                String::new()
            }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_else(|_| {
                if storage_backend == StorageBackend::Supabase {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                }
                String::new()
            }),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            booking_calendar_days: parse_or("BOOKING_CALENDAR_DAYS", 7),
            schedule_generation_max_days: parse_or("SCHEDULE_GENERATION_MAX_DAYS", 366),
            request_timeout_seconds: parse_or("REQUEST_TIMEOUT_SECONDS", 30),
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let storage_ready = match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
            }
        };

        !self.jwt_secret.is_empty() && storage_ready
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
