//! Connection and behaviour settings for a [`Client`](crate::client::Client).
//!
//! # Example
//!
//! ```rust
//! use firetree::config::Config;
//!
//! let config = Config::builder()
//!     .database_url("https://example.firebaseio.test")
//!     .auth_domain("example.test")
//!     .api_key("key")
//!     .user_profile("users")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.profile_path("u1").as_deref(), Some("users/u1"));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::path::DataPath;

pub mod errors;

pub use errors::ConfigError;

/// Settings for one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default, alias = "databaseURL")]
    pub database_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,

    /// Root under which user profiles live, one child per uid.
    ///
    /// Profiles are neither watched nor written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<String>,

    /// Log every dispatched action at `debug` level.
    #[serde(default)]
    pub enable_logging: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reads a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Invalid {
            reason: err.to_string(),
        })
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::Invalid {
            reason: format!("{}: {err}", path.display()),
        })?;
        let config = Self::from_json(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every required connection parameter is present.
    ///
    /// Fields are checked in the order `database_url`, `auth_domain`,
    /// `api_key`; the first missing one is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("databaseURL", &self.database_url),
            ("authDomain", &self.auth_domain),
            ("apiKey", &self.api_key),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ConfigError::MissingField { field: *field }),
            None => Ok(()),
        }
    }

    /// Location of a user's profile, when profiles are configured.
    pub fn profile_path(&self, uid: &str) -> Option<String> {
        self.user_profile
            .as_deref()
            .map(|root| DataPath::normalize(root).push(uid).to_string())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    pub fn auth_domain(mut self, auth_domain: impl Into<String>) -> Self {
        self.config.auth_domain = auth_domain.into();
        self
    }

    pub fn database_url(mut self, database_url: impl Into<String>) -> Self {
        self.config.database_url = database_url.into();
        self
    }

    pub fn storage_bucket(mut self, storage_bucket: impl Into<String>) -> Self {
        self.config.storage_bucket = Some(storage_bucket.into());
        self
    }

    pub fn user_profile(mut self, root: impl Into<String>) -> Self {
        self.config.user_profile = Some(root.into());
        self
    }

    pub fn enable_logging(mut self, enable: bool) -> Self {
        self.config.enable_logging = enable;
        self
    }

    /// Validates and returns the config.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
