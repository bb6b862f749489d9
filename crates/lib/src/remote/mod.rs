//! The remote hierarchical store that firetree mirrors.
//!
//! The network and auth SDK of the remote store is an external collaborator.
//! This module defines the capability surface firetree consumes from it as the
//! [`RemoteStore`] trait, together with the value types that cross that seam:
//! [`Query`], [`Snapshot`], [`Identity`] and [`AuthMethod`].
//!
//! [`InMemory`] is a complete in-process implementation, used for tests,
//! demos, and hosts that want a local-only store.

use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    event::EventKind,
    path::DataPath,
    query::{Bound, QueryDirective},
};

pub mod errors;
pub mod in_memory;

pub use errors::RemoteError;
pub use in_memory::InMemory;

/// The data at a location, as delivered by a read or a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Last segment of the location, `None` for the root
    pub key: Option<String>,
    /// The value; `Null` when nothing is stored there
    pub value: serde_json::Value,
}

impl Snapshot {
    /// Creates a snapshot for `path` holding `value`.
    pub fn new(path: &DataPath, value: serde_json::Value) -> Self {
        Self {
            key: path.key().map(str::to_string),
            value,
        }
    }

    /// Whether the location holds no data.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Opaque handle identifying one attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u64);

/// How children are ordered by a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderBy {
    Key,
    Value,
    Priority,
    /// A (possibly nested, slash-delimited) field of each child
    Child(String),
}

/// How many children a query keeps, and from which end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limit {
    First(u32),
    Last(u32),
}

/// A location plus ordering, range and limit constraints.
///
/// Built up one clause at a time, in the order the clauses are given. Later
/// clauses of the same kind replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub path: DataPath,
    pub order: Option<OrderBy>,
    pub start_at: Option<Bound>,
    pub end_at: Option<Bound>,
    pub limit: Option<Limit>,
}

impl Query {
    /// An unconstrained query for the whole location.
    pub fn new(path: impl Into<DataPath>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Builds a query by applying each directive in order.
    pub fn from_directives(path: impl Into<DataPath>, directives: &[QueryDirective]) -> Self {
        directives
            .iter()
            .fold(Self::new(path), |query, directive| query.apply(directive))
    }

    /// Applies one directive.
    pub fn apply(self, directive: &QueryDirective) -> Self {
        match directive {
            QueryDirective::OrderByValue => self.order_by(OrderBy::Value),
            QueryDirective::OrderByPriority => self.order_by(OrderBy::Priority),
            QueryDirective::OrderByKey => self.order_by(OrderBy::Key),
            QueryDirective::OrderByChild(field) => self.order_by(OrderBy::Child(field.clone())),
            QueryDirective::LimitToFirst(n) => self.limit_to_first(*n),
            QueryDirective::LimitToLast(n) => self.limit_to_last(*n),
            QueryDirective::EqualTo(bound) => self.equal_to(bound.clone()),
            QueryDirective::StartAt(bound) => self.start_at(bound.clone()),
            QueryDirective::EndAt(bound) => self.end_at(bound.clone()),
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit_to_first(mut self, n: u32) -> Self {
        self.limit = Some(Limit::First(n));
        self
    }

    pub fn limit_to_last(mut self, n: u32) -> Self {
        self.limit = Some(Limit::Last(n));
        self
    }

    pub fn start_at(mut self, bound: Bound) -> Self {
        self.start_at = Some(bound);
        self
    }

    pub fn end_at(mut self, bound: Bound) -> Self {
        self.end_at = Some(bound);
        self
    }

    /// Restricts the query to children whose ordering value equals `bound`.
    pub fn equal_to(self, bound: Bound) -> Self {
        self.start_at(bound.clone()).end_at(bound)
    }

    /// Whether the query selects the location's full value unchanged.
    pub fn is_unconstrained(&self) -> bool {
        self.order.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
            && self.limit.is_none()
    }
}

/// A signed-in identity as reported by the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl Identity {
    /// Creates an identity with only a uid.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// JSON form of the identity, as stored in state.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("uid".into(), self.uid.clone().into());
        if let Some(email) = &self.email {
            map.insert("email".into(), email.clone().into());
        }
        if let Some(name) = &self.display_name {
            map.insert("displayName".into(), name.clone().into());
        }
        if let Some(provider) = &self.provider_id {
            map.insert("providerId".into(), provider.clone().into());
        }
        serde_json::Value::Object(map)
    }
}

/// How to authenticate against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    EmailPassword { email: String, password: String },
    CustomToken { token: String },
    /// A credential already obtained from a third-party provider
    Credential { provider: String, token: String },
    Popup { provider: String },
    Redirect { provider: String },
    Anonymous,
}

impl AuthMethod {
    /// Short name of the method, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::EmailPassword { .. } => "email_password",
            AuthMethod::CustomToken { .. } => "custom_token",
            AuthMethod::Credential { .. } => "credential",
            AuthMethod::Popup { .. } => "popup",
            AuthMethod::Redirect { .. } => "redirect",
            AuthMethod::Anonymous => "anonymous",
        }
    }
}

/// Callback invoked for every notification of a subscription.
pub type SnapshotCallback = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// Boxed future returned by identity callbacks.
pub type IdentityCallbackFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Async callback invoked whenever the signed-in identity changes.
pub type IdentityCallback = Arc<dyn Fn(Option<Identity>) -> IdentityCallbackFuture + Send + Sync>;

/// Capability surface of the remote store.
///
/// Implementations deliver notifications for one subscription in the order
/// the store observed them; no ordering is promised across subscriptions.
/// Failures are reported as [`RemoteError`]s wrapped in the crate error and
/// are never retried by firetree.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads the value at `path` once.
    async fn read(&self, path: &str) -> Result<Snapshot>;

    /// Reads the first `limit` children of `path` under `order`, once.
    async fn read_ordered(&self, path: &str, order: OrderBy, limit: u32) -> Result<Snapshot>;

    /// Attaches a listener for `event` on `query`.
    ///
    /// `value` listeners fire immediately with the current value and
    /// `child_added` listeners fire once per existing child.
    async fn subscribe(
        &self,
        query: &Query,
        event: EventKind,
        callback: SnapshotCallback,
    ) -> Result<SubscriptionHandle>;

    /// Detaches a listener. Unknown handles are ignored.
    fn unsubscribe(&self, path: &str, event: EventKind, handle: SubscriptionHandle);

    /// Replaces the value at `path`. Writing `null` deletes it.
    async fn write(&self, path: &str, value: serde_json::Value) -> Result<()>;

    /// Writes each entry of `partial` relative to `path`, leaving other children alone.
    async fn merge(
        &self,
        path: &str,
        partial: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()>;

    /// Adds `value` as a new child of `path` under a generated key.
    async fn append(&self, path: &str, value: serde_json::Value) -> Result<String>;

    /// Deletes the value at `path`.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Signs in.
    async fn authenticate(&self, method: &AuthMethod) -> Result<Identity>;

    /// Signs out.
    async fn deauthenticate(&self) -> Result<()>;

    /// Registers an identity listener. It fires immediately with the current identity.
    async fn on_identity_change(&self, callback: IdentityCallback) -> Result<SubscriptionHandle>;

    /// Removes an identity listener.
    fn off_identity_change(&self, handle: SubscriptionHandle);
}
