//! Environment overlay for configuration.
//!
//! Kept in its own test binary: `APP__*` variables are process-wide and would
//! leak into the file-based cases in `config_test.rs`.

use greeting_service::config::GreetingConfig;
use std::io::Write;

#[test]
fn app_prefixed_variables_fill_and_override_settings() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut file = std::fs::File::create(dir.path().join("configuration.toml"))
        .expect("Failed to create configuration file");
    file.write_all(b"port = 8000\nlog_level = \"debug\"\n").unwrap();

    std::env::set_var("APP__PORT", "8181");
    std::env::set_var("APP__MONGODB__URI", "mongodb://mongo.internal:27017");
    std::env::set_var("APP__REDIS__URL", "cache.internal:6379");

    let config = GreetingConfig::load(dir.path()).unwrap();

    assert_eq!(config.port, 8181);
    assert_eq!(config.mongodb.uri, "mongodb://mongo.internal:27017");
    assert_eq!(config.redis.url, "cache.internal:6379");
    assert_eq!(config.log_level, "debug");
}
