use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::{MemoryDatabase, MemoryOtpCache, OtpCache, Repositories};

use crate::delivery::{OtpDelivery, TracingOtpDelivery};
use crate::realtime::ConversationHub;

/// Dependencies handed to every cell's router and services.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub otp_cache: Arc<dyn OtpCache>,
    pub otp_delivery: Arc<dyn OtpDelivery>,
    pub hub: ConversationHub,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repos: Repositories,
        otp_cache: Arc<dyn OtpCache>,
        otp_delivery: Arc<dyn OtpDelivery>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repos,
            otp_cache,
            otp_delivery,
            hub: ConversationHub::new(),
        }
    }

    /// Everything held in process memory.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Repositories::from_store(Arc::new(MemoryDatabase::new())),
            Arc::new(MemoryOtpCache::new()),
            Arc::new(TracingOtpDelivery),
        )
    }
}
