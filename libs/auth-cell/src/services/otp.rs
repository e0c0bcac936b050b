use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use shared_config::OtpCodePolicy;
use shared_database::OtpCache;
use shared_utils::AppState;

use crate::models::{AuthError, IdentifierType, OtpContext};

/// Issues and consumes one-time codes. A code is bound to one
/// (context, identifier type, identifier) key, and issuing again replaces it.
#[derive(Clone)]
pub struct OtpService {
    cache: Arc<dyn OtpCache>,
    policy: OtpCodePolicy,
    ttl: Duration,
}

impl OtpService {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(
            state.otp_cache.clone(),
            state.config.otp_policy.clone(),
            state.config.otp_ttl(),
        )
    }

    pub fn with_parts(cache: Arc<dyn OtpCache>, policy: OtpCodePolicy, ttl: Duration) -> Self {
        Self { cache, policy, ttl }
    }

    pub fn cache_key(context: OtpContext, id_type: IdentifierType, identifier: &str) -> String {
        format!("otp:{}:{}:{}", context.as_str(), id_type.as_str(), identifier)
    }

    fn generate_code(&self) -> String {
        match &self.policy {
            OtpCodePolicy::Fixed(code) => code.clone(),
            OtpCodePolicy::Random { digits } => {
                let low = 10u64.pow(digits.saturating_sub(1));
                let high = 10u64.pow(*digits);
                rand::thread_rng().gen_range(low..high).to_string()
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        context: OtpContext,
        id_type: IdentifierType,
        identifier: &str,
    ) -> Result<String, AuthError> {
        let key = Self::cache_key(context, id_type, identifier);
        let code = self.generate_code();

        self.cache.put(&key, &code, self.ttl).await?;
        debug!("Issued {} code, valid for {:?}", context.as_str(), self.ttl);

        Ok(code)
    }

    /// Checks without consuming.
    pub async fn validate(
        &self,
        context: OtpContext,
        id_type: IdentifierType,
        identifier: &str,
        code: &str,
    ) -> Result<bool, AuthError> {
        let key = Self::cache_key(context, id_type, identifier);
        Ok(self.cache.get(&key).await?.is_some_and(|stored| stored == code.trim()))
    }

    /// Deletes the code when it matches. Of two concurrent consumers of the
    /// same code at most one gets `true`.
    #[instrument(skip(self, code))]
    pub async fn consume(
        &self,
        context: OtpContext,
        id_type: IdentifierType,
        identifier: &str,
        code: &str,
    ) -> Result<bool, AuthError> {
        let key = Self::cache_key(context, id_type, identifier);
        let consumed = self.cache.take_if_matches(&key, code.trim()).await?;

        if !consumed {
            debug!("Rejected {} code", context.as_str());
        }
        Ok(consumed)
    }
}
