//! Error types for client operations.

use thiserror::Error;

/// Errors raised by [`Client`](super::Client) operations themselves, as
/// opposed to failures reported by the remote store.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A unique write found data already stored at its location.
    #[error("Path already exists: {path}")]
    PathExists {
        /// The location that was already occupied
        path: String,
    },

    /// A merge was given something other than an object.
    #[error("Cannot merge a non-object value into '{path}'")]
    NotAnObject {
        /// The location of the rejected merge
        path: String,
    },
}

impl ClientError {
    /// Check if this error is a duplicate-resource rejection.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::PathExists { .. })
    }
}

impl From<ClientError> for crate::Error {
    fn from(err: ClientError) -> Self {
        crate::Error::Client(err)
    }
}
