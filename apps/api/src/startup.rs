use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use auth_cell::services::AccountService;
use shared_config::{AppConfig, StorageBackend};
use shared_database::{MemoryDatabase, MemoryOtpCache, OtpCache, RedisOtpCache, Repositories, SupabaseDatabase};
use shared_utils::delivery::TracingOtpDelivery;
use shared_utils::AppState;

/// Wires the configured storage and OTP cache into the shared state.
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let repos = match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            Repositories::from_store(Arc::new(MemoryDatabase::new()))
        }
        StorageBackend::Supabase => {
            info!("Using PostgREST storage at {}", config.supabase_url);
            Repositories::from_store(Arc::new(SupabaseDatabase::new(&config)))
        }
    };

    let otp_cache: Arc<dyn OtpCache> = match &config.redis_url {
        Some(url) => {
            let cache = RedisOtpCache::new(url)
                .await
                .context("Failed to connect to Redis for the OTP cache")?;
            info!("One-time codes are stored in Redis");
            Arc::new(cache)
        }
        None => Arc::new(MemoryOtpCache::new()),
    };

    Ok(AppState::new(config, repos, otp_cache, Arc::new(TracingOtpDelivery)))
}

/// Creates or promotes the configured admin account. A no-op when either
/// credential is missing.
pub async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) else {
        return Ok(());
    };

    let created = AccountService::new(state)
        .seed_admin(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed admin {}: {}", email, e))?;

    if created {
        info!("Seeded admin account {}", email);
    }
    Ok(())
}
