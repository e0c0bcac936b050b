use async_trait::async_trait;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryChannel {
    Email,
    Sms,
}

/// Outbound channel for one-time codes (email or SMS gateway).
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn deliver(
        &self,
        channel: DeliveryChannel,
        destination: &str,
        purpose: &str,
        code: &str,
    ) -> anyhow::Result<()>;
}

/// Writes codes to the log instead of sending them. The code itself is only
/// emitted at debug level.
#[derive(Debug, Default, Clone)]
pub struct TracingOtpDelivery;

#[async_trait]
impl OtpDelivery for TracingOtpDelivery {
    async fn deliver(
        &self,
        channel: DeliveryChannel,
        destination: &str,
        purpose: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        info!("Dispatching {} code via {:?} to {}", purpose, channel, destination);
        debug!("{} code for {}: {}", purpose, destination, code);
        Ok(())
    }
}
