//! Configuration error types.

use thiserror::Error;

/// Errors raised while validating a [`Config`](super::Config).
///
/// Configuration errors are fatal: they are returned synchronously from
/// [`Client::new`](crate::client::Client::new) before anything is attached.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required connection parameter is missing or empty.
    #[error("Remote store {field} is required")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// The configuration could not be read.
    #[error("Invalid configuration: {reason}")]
    Invalid {
        /// Description of the problem
        reason: String,
    },
}

impl ConfigError {
    /// Check if this error is a missing required field.
    pub fn is_missing_field(&self) -> bool {
        matches!(self, ConfigError::MissingField { .. })
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}
