use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Name of the optional settings file looked up under the base path.
/// Any extension supported by the `config` crate is accepted.
pub const CONFIG_FILE_NAME: &str = "configuration";

/// Load settings of type `T` rooted at `base_path`.
///
/// Sources, lowest precedence first:
/// - `<base_path>/configuration.{toml,yaml,json,...}` (optional)
/// - `APP__`-prefixed environment variables, `__` separating nested keys
///
/// A `<base_path>/.env` file, if present, is loaded into the process
/// environment before the environment source is read.
pub fn load<T: DeserializeOwned>(base_path: impl AsRef<Path>) -> Result<T, AppError> {
    let base_path = base_path.as_ref();
    dotenvy::from_path(base_path.join(".env")).ok();

    let file = base_path.join(CONFIG_FILE_NAME);
    let config = Cfg::builder()
        .add_source(File::with_name(&file.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}
