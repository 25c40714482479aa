use crate::config::RedisConfig;
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait Cache: Send + Sync {
    async fn ping(&self) -> Result<(), AppError>;

    /// Store `value` under `key` without expiration, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Fetch `key`; an absent key is [`AppError::NotFound`].
    async fn get(&self, key: &str) -> Result<String, AppError>;
}

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

/// Accept both `redis://host:port` URLs and bare `host:port` addresses.
pub fn connection_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}

impl RedisCache {
    /// Open one multiplexed connection to `config.url` and confirm it with
    /// `PING`. A single attempt is made; a refused connection fails at once.
    pub async fn connect(config: &RedisConfig) -> Result<Self, AppError> {
        let url = connection_url(&config.url);
        tracing::info!(url = %url, "Connecting to Redis");

        let client = Client::open(url).map_err(|e| {
            tracing::error!("Invalid Redis address: {}", e);
            AppError::ConnectionError(anyhow::Error::new(e))
        })?;

        let conn = client.get_multiplexed_async_connection().await.map_err(|e| {
            tracing::error!("Failed to connect to Redis: {}", e);
            AppError::ConnectionError(anyhow::Error::new(e))
        })?;

        let cache = Self { conn };
        cache.ping().await?;

        tracing::info!("Redis client connected successfully");
        Ok(cache)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!("Redis liveness probe failed: {}", e);
                AppError::ConnectionError(anyhow::Error::new(e))
            })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn get(&self, key: &str) -> Result<String, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        value.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("key: {} does not exist", key)))
    }
}

/// In-memory [`Cache`] for tests, with failure injection.
#[derive(Clone, Default)]
pub struct MockCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
    unreachable: bool,
    fail_writes: bool,
    fail_reads: bool,
    evict_on_read: bool,
    reads: Arc<AtomicUsize>,
    connects: Arc<AtomicUsize>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Simulates another client deleting a key between a write and the
    /// following read.
    pub fn evicting_before_read() -> Self {
        Self {
            evict_on_read: true,
            ..Self::default()
        }
    }

    /// Mirrors [`RedisCache::connect`]; counts every attempt.
    pub async fn connect(self) -> Result<Self, AppError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.ping().await?;
        Ok(self)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Direct access to the stored value, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Overwrite a key as an external writer would.
    pub fn overwrite(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|e| AppError::ConnectionError(anyhow::anyhow!("Mock cache mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl Cache for MockCache {
    async fn ping(&self) -> Result<(), AppError> {
        if self.unreachable {
            return Err(AppError::ConnectionError(anyhow::anyhow!(
                "connection refused"
            )));
        }
        Ok(())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        if self.fail_writes {
            return Err(AppError::RedisError(redis::RedisError::from((
                redis::ErrorKind::ReadOnly,
                "You can't write against a read only replica.",
            ))));
        }
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(AppError::RedisError(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "broken pipe",
            ))));
        }

        let mut entries = self.entries()?;
        if self.evict_on_read {
            entries.remove(key);
        }
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("key: {} does not exist", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_is_promoted_to_url() {
        assert_eq!(connection_url("localhost:6379"), "redis://localhost:6379");
    }

    #[test]
    fn full_url_is_kept() {
        assert_eq!(
            connection_url("rediss://cache.internal:6380/0"),
            "rediss://cache.internal:6380/0"
        );
    }

    #[tokio::test]
    async fn refused_connection_fails_without_retrying() {
        let config = RedisConfig {
            url: "127.0.0.1:1".to_string(),
        };
        let started = std::time::Instant::now();

        let err = RedisCache::connect(&config).await.err().unwrap();

        assert!(matches!(err, AppError::ConnectionError(_)));
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }

    #[tokio::test]
    async fn mock_get_of_missing_key_is_not_found() {
        let cache = MockCache::new();

        let err = cache.get("missing").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn mock_set_overwrites() {
        let cache = MockCache::new();
        cache.set("test", "first").await.unwrap();
        cache.set("test", "second").await.unwrap();

        assert_eq!(cache.get("test").await.unwrap(), "second");
    }
}
