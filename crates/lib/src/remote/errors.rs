//! Error types for remote store operations.

use thiserror::Error;

/// Errors reported by a [`RemoteStore`](super::RemoteStore).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` and `code()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The store refused access to a location.
    #[error("Permission denied at '{path}'")]
    PermissionDenied {
        /// The location that was refused
        path: String,
    },

    /// An authentication attempt failed.
    #[error("Authentication failed ({code}): {message}")]
    AuthenticationFailed {
        /// Provider error code, e.g. `auth/user-not-found`
        code: String,
        /// Human-readable description
        message: String,
    },

    /// The store could not be reached.
    #[error("Remote store unavailable: {reason}")]
    Unavailable {
        /// Description of the connectivity failure
        reason: String,
    },

    /// The operation was rejected for another reason.
    #[error("Remote operation '{operation}' failed: {reason}")]
    OperationFailed {
        /// The operation that failed
        operation: String,
        /// Description of the failure
        reason: String,
    },
}

impl RemoteError {
    /// A short machine-readable code for the error.
    pub fn code(&self) -> &str {
        match self {
            RemoteError::PermissionDenied { .. } => "permission-denied",
            RemoteError::AuthenticationFailed { code, .. } => code,
            RemoteError::Unavailable { .. } => "unavailable",
            RemoteError::OperationFailed { .. } => "operation-failed",
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, RemoteError::AuthenticationFailed { .. })
    }

    /// Check if this error indicates access was refused.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, RemoteError::PermissionDenied { .. })
    }

    /// Check if this error is a connectivity failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RemoteError::Unavailable { .. })
    }
}

impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
