//!
//! firetree: mirrors a remote hierarchical store into a local immutable state tree.
//!
//! ## Core Concepts
//!
//! * **Composite paths (`query`)**: a path string may carry a query after a `#`
//!   (`scores#orderByChild=score&limitToLast=3`), parsed into ordered [`query::QueryDirective`]s.
//! * **Watches (`watcher`)**: every watch is counted under a watch-id derived from its event
//!   kind, path and query id. The remote listener is attached by the first watch and detached
//!   by the last unwatch.
//! * **Remote store (`remote`)**: the [`remote::RemoteStore`] trait is everything firetree
//!   needs from the store it mirrors. [`remote::InMemory`] implements it in-process.
//! * **Actions and state (`state`)**: remote notifications become [`state::Action`]s which
//!   the pure [`state::reduce`] folds into a structurally shared [`state::State`].
//! * **Client (`client`)**: the per-instance [`Client`] handle tying a config, a remote store,
//!   a watcher registry and a dispatch target (usually a [`store::Store`]) together.

pub mod client;
pub mod config;
pub mod constants;
pub mod event;
pub mod path;
pub mod query;
pub mod remote;
pub mod state;
pub mod store;
pub mod watcher;

pub use client::{Client, WeakClient};
pub use state::{Action, State};
pub use store::{Dispatch, Store};

/// Result type used throughout the firetree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the firetree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured query parse errors from the query module
    #[error(transparent)]
    Query(query::QueryError),

    /// Structured remote store errors from the remote module
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),

    /// Structured client errors from the client module
    #[error(transparent)]
    Client(client::ClientError),

    /// An event kind name that is not recognized
    #[error(transparent)]
    UnknownEvent(event::UnknownEventKind),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Query(_) => "query",
            Error::Remote(_) => "remote",
            Error::Config(_) => "config",
            Error::Client(_) => "client",
            Error::UnknownEvent(_) => "event",
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Client(client_err) => client_err.is_already_exists(),
            _ => false,
        }
    }

    /// Check if this error is a connectivity failure.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if this error is remote store-related.
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this error came from parsing a composite path.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Error::Query(_))
    }

    /// Remote error code, when the error came from the remote store.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Remote(remote_err) => Some(remote_err.code()),
            _ => None,
        }
    }
}
