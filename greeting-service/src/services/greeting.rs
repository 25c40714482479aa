use crate::services::Cache;
use service_core::error::AppError;

pub const GREETING_KEY: &str = "test";
pub const GREETING: &str = "Welcome to Axum with Redis and MongoDB";

/// Write the greeting under [`GREETING_KEY`] and read it straight back.
///
/// A failed write is fatal. On read-back only an absent key is tolerated:
/// it is logged and the empty string is served instead. Any other read
/// error is fatal.
pub async fn seed_greeting(cache: &dyn Cache) -> Result<String, AppError> {
    cache.set(GREETING_KEY, GREETING).await.map_err(|e| {
        tracing::error!(key = GREETING_KEY, "Failed to seed greeting: {}", e);
        e
    })?;

    match cache.get(GREETING_KEY).await {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => {
            tracing::warn!(key = GREETING_KEY, "Greeting key does not exist, serving empty message");
            Ok(String::new())
        }
        Err(e) => {
            tracing::error!(key = GREETING_KEY, "Failed to read greeting back: {}", e);
            Err(e)
        }
    }
}
