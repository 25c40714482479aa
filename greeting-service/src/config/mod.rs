use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::path::Path;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GreetingConfig {
    pub port: u16,
    #[validate(nested)]
    pub mongodb: MongoConfig,
    #[validate(nested)]
    pub redis: RedisConfig,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MongoConfig {
    #[validate(length(min = 1, message = "mongodb.uri must not be empty"))]
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedisConfig {
    /// Either a `redis://` URL or a bare `host:port` address.
    #[validate(length(min = 1, message = "redis.url must not be empty"))]
    pub url: String,
}

fn default_service_name() -> String {
    "greeting-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GreetingConfig {
    /// Load from `<base_path>/configuration.*`, `<base_path>/.env` and
    /// `APP__*` variables. Port, MongoDB URI and Redis address have no
    /// defaults.
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let config: GreetingConfig = core_config::load(base_path)?;
        config.validate()?;
        Ok(config)
    }
}
