use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const ENCRYPTION_KEY_VAR: &str = "DOCKYARD_ENCRYPTION_KEY";

#[derive(Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_versions_to_keep")]
    pub max_versions_to_keep: usize,
    #[serde(default)]
    pub encryption_key: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_directory() -> PathBuf {
    PathBuf::from("./data")
}

fn default_namespace() -> String {
    "captain".to_string()
}

fn default_max_versions_to_keep() -> usize {
    50
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("data_directory", &self.data_directory)
            .field("namespace", &self.namespace)
            .field("max_versions_to_keep", &self.max_versions_to_keep)
            .field("encryption_key", &"****")
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl Settings {
    fn check(self) -> Result<Self, config::ConfigError> {
        if self.max_versions_to_keep < 1 {
            return Err(config::ConfigError::Message(
                "max_versions_to_keep must be at least 1".to_string(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(config::ConfigError::Message("namespace cannot be empty".to_string()));
        }
        if self.encryption_key.is_empty() {
            return Err(config::ConfigError::NotFound(ENCRYPTION_KEY_VAR.to_string()));
        }
        Ok(self)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Optional `configuration.{yaml,json,toml}`, then DOCKYARD__<FIELD> overrides
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("DOCKYARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Settings = settings.try_deserialize()?;

    if let Ok(key) = std::env::var(ENCRYPTION_KEY_VAR) {
        config.encryption_key = key;
    }

    config.check()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_overrides(overrides: &[(&str, &str)]) -> Result<Settings, config::ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()
    }

    #[test]
    fn test_defaults() {
        let settings = from_overrides(&[("encryption_key", "k")]).unwrap();
        assert_eq!(settings.namespace, "captain");
        assert_eq!(settings.max_versions_to_keep, 50);
        assert_eq!(settings.data_directory, PathBuf::from("./data"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(from_overrides(&[]).is_err());
        assert!(from_overrides(&[("encryption_key", "k"), ("max_versions_to_keep", "0")]).is_err());
    }

    #[test]
    fn test_debug_masks_key() {
        let settings = from_overrides(&[("encryption_key", "super-secret")]).unwrap();
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }
}
