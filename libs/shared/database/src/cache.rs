use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Key-value store with per-key TTL holding one-time codes.
#[async_trait]
pub trait OtpCache: Send + Sync {
    /// Stores `code` under `key`, replacing any previous value and TTL.
    async fn put(&self, key: &str, code: &str, ttl: Duration) -> StoreResult<()>;
    /// Current live value, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Deletes the key only if it currently holds `code`. Of two concurrent
    /// calls with the right code exactly one returns true.
    async fn take_if_matches(&self, key: &str, code: &str) -> StoreResult<bool>;
}

#[derive(Default)]
pub struct MemoryOtpCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryOtpCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpCache for MemoryOtpCache {
    async fn put(&self, key: &str, code: &str, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (code.to_string(), now + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(code, _)| code.clone()))
    }

    async fn take_if_matches(&self, key: &str, code: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        let matches = matches!(
            entries.get(key),
            Some((stored, expires_at)) if stored == code && *expires_at > Instant::now()
        );
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }
}

const TAKE_IF_MATCHES: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

pub struct RedisOtpCache {
    pool: Pool,
}

impl RedisOtpCache {
    pub async fn new(redis_url: &str) -> StoreResult<Self> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to create Redis pool",
                format!("Pool creation error: {}", e),
            )))
        })?;

        let cache = Self { pool };

        // Test connection
        let mut conn = cache.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis OTP cache initialized successfully");

        Ok(cache)
    }

    async fn get_connection(&self) -> StoreResult<Connection> {
        self.pool.get().await.map_err(|e| {
            StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to connect to Redis",
                format!("Connection error: {}", e),
            )))
        })
    }
}

#[async_trait]
impl OtpCache for RedisOtpCache {
    async fn put(&self, key: &str, code: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(code)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        debug!("Stored OTP under {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn take_if_matches(&self, key: &str, code: &str) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let script = redis::Script::new(TAKE_IF_MATCHES);
        let removed: i64 = script.key(key).arg(code).invoke_async(&mut conn).await?;
        Ok(removed == 1)
    }
}
