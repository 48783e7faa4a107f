use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load configuration from a file on disk, layered with `APP_`-prefixed
/// environment overrides (`APP_DATABASE__HOST` maps to `database.host`).
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let config_path =
        std::fs::canonicalize(path.as_ref()).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    let settings = Config::builder()
        .add_source(File::from(config_path))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    settings.try_deserialize::<T>()
}
