//! Write helpers that pass straight through to the remote store.
//!
//! Writes do not touch local state directly; whatever is watched picks the
//! change up through its listeners.

use serde_json::Value as Json;
use tracing::debug;

use super::{Client, ClientError};
use crate::Result;

impl Client {
    /// Replaces the value at `path`.
    pub async fn set(&self, path: &str, value: Json) -> Result<()> {
        self.inner.remote.write(path, value).await
    }

    /// Adds `value` under a generated child key of `path` and returns the key.
    pub async fn push(&self, path: &str, value: Json) -> Result<String> {
        let key = self.inner.remote.append(path, value).await?;
        debug!(path, %key, "pushed child");
        Ok(key)
    }

    /// Merges the entries of an object into `path`.
    pub async fn update(&self, path: &str, value: Json) -> Result<()> {
        let Json::Object(partial) = value else {
            return Err(ClientError::NotAnObject {
                path: path.to_string(),
            }
            .into());
        };
        self.inner.remote.merge(path, partial).await
    }

    /// Deletes the value at `path`.
    pub async fn remove(&self, path: &str) -> Result<()> {
        self.inner.remote.delete(path).await
    }

    /// Writes `value` at `path` only if nothing is stored there yet.
    ///
    /// The location is read first; when it holds data the write is never
    /// attempted and [`ClientError::PathExists`] is returned.
    pub async fn unique_set(&self, path: &str, value: Json) -> Result<()> {
        let existing = self.inner.remote.read(path).await?;
        if !existing.is_empty() {
            return Err(ClientError::PathExists {
                path: path.to_string(),
            }
            .into());
        }
        self.inner.remote.write(path, value).await
    }
}
