//! In-process implementation of the remote store.
//!
//! `InMemory` keeps the whole tree as one JSON value and evaluates queries
//! and listener notifications locally. It follows the remote store's
//! conventions closely enough to drive the rest of the crate:
//!
//! - empty objects and `null` do not exist; writing them deletes, and deleting
//!   prunes parents that become empty
//! - `value` listeners fire on attach with the current value, `child_added`
//!   listeners fire on attach once per existing child
//! - integer-like keys sort numerically and before all other keys
//!
//! Failure injection (`deny_writes`, `set_unavailable`) and a small account
//! table (`add_account`) let tests exercise the error paths.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Mutex, RwLock,
        atomic::{AtomicU64, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use super::{
    AuthMethod, Identity, IdentityCallback, Limit, OrderBy, Query, RemoteError, RemoteStore,
    Snapshot, SnapshotCallback, SubscriptionHandle,
};
use crate::{
    Result,
    event::EventKind,
    path::{DataPath, segments},
    query::Bound,
};

/// Query result for one listener: the selected value and its ordered children.
#[derive(Debug, Clone, Default, PartialEq)]
struct View {
    value: Json,
    children: Vec<(String, Json)>,
}

struct Listener {
    handle: SubscriptionHandle,
    query: Query,
    event: EventKind,
    callback: SnapshotCallback,
    view: View,
}

struct Account {
    password: String,
    identity: Identity,
}

/// A remote store held entirely in memory.
pub struct InMemory {
    root: RwLock<Json>,
    listeners: Mutex<Vec<Listener>>,
    identity_listeners: Mutex<Vec<(SubscriptionHandle, IdentityCallback)>>,
    identity: RwLock<Option<Identity>>,
    /// Accounts keyed by email
    accounts: RwLock<HashMap<String, Account>>,
    denied_writes: RwLock<Vec<DataPath>>,
    unavailable: RwLock<bool>,
    next_handle: AtomicU64,
    next_push: AtomicU64,
}

impl std::fmt::Debug for InMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemory")
            .field("root", &self.root)
            .field(
                "listeners",
                &format!("<{} listeners>", self.listener_count()),
            )
            .field("identity", &self.identity)
            .finish()
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_data(Json::Null)
    }

    /// Creates a store seeded with `data` at the root.
    pub fn with_data(data: Json) -> Self {
        Self {
            root: RwLock::new(data),
            listeners: Mutex::new(Vec::new()),
            identity_listeners: Mutex::new(Vec::new()),
            identity: RwLock::new(None),
            accounts: RwLock::new(HashMap::new()),
            denied_writes: RwLock::new(Vec::new()),
            unavailable: RwLock::new(false),
            next_handle: AtomicU64::new(1),
            next_push: AtomicU64::new(0),
        }
    }

    /// Registers an email/password account.
    pub fn add_account(&self, email: &str, password: &str, identity: Identity) {
        self.accounts.write().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity,
            },
        );
    }

    /// Rejects every write at or below `path` with a permission error.
    pub fn deny_writes(&self, path: &str) {
        self.denied_writes
            .write()
            .unwrap()
            .push(DataPath::normalize(path));
    }

    /// Makes every remote operation fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap() = unavailable;
    }

    /// The value currently stored at `path` (`Null` when absent).
    pub fn value_at(&self, path: &str) -> Json {
        let root = self.root.read().unwrap();
        get_at(&root, &DataPath::normalize(path))
            .cloned()
            .unwrap_or(Json::Null)
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Number of attached listeners for `event` at `path`.
    pub fn listeners_at(&self, path: &str, event: EventKind) -> usize {
        let path = DataPath::normalize(path);
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.event == event && l.query.path == path)
            .count()
    }

    /// The currently signed-in identity.
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.read().unwrap().clone()
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if *self.unavailable.read().unwrap() {
            return Err(RemoteError::Unavailable {
                reason: format!("store offline during {operation}"),
            }
            .into());
        }
        Ok(())
    }

    fn check_writable(&self, path: &DataPath) -> Result<()> {
        self.check_available("write")?;
        let denied = self.denied_writes.read().unwrap();
        if denied.iter().any(|prefix| is_prefix(prefix, path)) {
            return Err(RemoteError::PermissionDenied {
                path: path.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn next_handle(&self) -> SubscriptionHandle {
        SubscriptionHandle(self.next_handle.fetch_add(1, AtomicOrdering::SeqCst))
    }

    /// Generates a push key. Keys sort in creation order.
    fn push_key(&self) -> String {
        let seq = self.next_push.fetch_add(1, AtomicOrdering::SeqCst);
        format!("-{seq:012}{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
    }

    /// Applies `mutate` to the tree and notifies every listener whose view changed.
    fn mutate(&self, mutate: impl FnOnce(&mut Json)) {
        let pending = {
            let mut root = self.root.write().unwrap();
            mutate(&mut root);
            if is_empty_node(&root) {
                *root = Json::Null;
            }

            let mut listeners = self.listeners.lock().unwrap();
            let mut pending = Vec::new();
            for listener in listeners.iter_mut() {
                let view = compute_view(&root, &listener.query);
                for snapshot in diff_views(listener, &listener.view, &view) {
                    pending.push((listener.callback.clone(), snapshot));
                }
                listener.view = view;
            }
            pending
        };

        trace!(notifications = pending.len(), "delivering notifications");
        for (callback, snapshot) in pending {
            callback(snapshot);
        }
    }

    async fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write().unwrap() = identity.clone();
        let callbacks: Vec<IdentityCallback> = self
            .identity_listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(identity.clone()).await;
        }
    }
}

#[async_trait]
impl RemoteStore for InMemory {
    async fn read(&self, path: &str) -> Result<Snapshot> {
        self.check_available("read")?;
        let path = DataPath::normalize(path);
        Ok(Snapshot::new(&path, self.value_at(path.as_str())))
    }

    async fn read_ordered(&self, path: &str, order: OrderBy, limit: u32) -> Result<Snapshot> {
        self.check_available("read")?;
        let query = Query::new(path).order_by(order).limit_to_first(limit);
        let view = compute_view(&self.root.read().unwrap(), &query);
        Ok(Snapshot::new(&query.path, view.value))
    }

    async fn subscribe(
        &self,
        query: &Query,
        event: EventKind,
        callback: SnapshotCallback,
    ) -> Result<SubscriptionHandle> {
        self.check_available("subscribe")?;
        if !event.is_live() {
            return Err(RemoteError::OperationFailed {
                operation: "subscribe".to_string(),
                reason: format!("'{event}' cannot be subscribed to"),
            }
            .into());
        }

        let handle = self.next_handle();
        let initial = {
            let root = self.root.read().unwrap();
            let view = compute_view(&root, query);
            let initial: Vec<Snapshot> = match event {
                EventKind::Value => vec![Snapshot::new(&query.path, view.value.clone())],
                EventKind::ChildAdded => view
                    .children
                    .iter()
                    .map(|(key, value)| Snapshot {
                        key: Some(key.clone()),
                        value: value.clone(),
                    })
                    .collect(),
                _ => Vec::new(),
            };
            self.listeners.lock().unwrap().push(Listener {
                handle,
                query: query.clone(),
                event,
                callback: callback.clone(),
                view,
            });
            initial
        };

        debug!(path = %query.path, %event, handle = handle.0, "listener attached");
        for snapshot in initial {
            callback(snapshot);
        }
        Ok(handle)
    }

    fn unsubscribe(&self, path: &str, event: EventKind, handle: SubscriptionHandle) {
        let path = DataPath::normalize(path);
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|l| !(l.handle == handle && l.event == event && l.query.path == path));
        if listeners.len() < before {
            debug!(%path, %event, handle = handle.0, "listener detached");
        }
    }

    async fn write(&self, path: &str, value: Json) -> Result<()> {
        let path = DataPath::normalize(path);
        self.check_writable(&path)?;
        self.mutate(|root| put_at(root, &path, value));
        Ok(())
    }

    async fn merge(&self, path: &str, partial: Map<String, Json>) -> Result<()> {
        let path = DataPath::normalize(path);
        for key in partial.keys() {
            self.check_writable(&path.clone().push(key))?;
        }
        self.mutate(|root| {
            for (key, value) in partial {
                put_at(root, &path.clone().push(&key), value);
            }
        });
        Ok(())
    }

    async fn append(&self, path: &str, value: Json) -> Result<String> {
        let key = self.push_key();
        let child = DataPath::normalize(path).push(&key);
        self.check_writable(&child)?;
        self.mutate(|root| put_at(root, &child, value));
        Ok(key)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = DataPath::normalize(path);
        self.check_writable(&path)?;
        self.mutate(|root| put_at(root, &path, Json::Null));
        Ok(())
    }

    async fn authenticate(&self, method: &AuthMethod) -> Result<Identity> {
        self.check_available("authenticate")?;
        let failed = |code: &str, message: &str| RemoteError::AuthenticationFailed {
            code: code.to_string(),
            message: message.to_string(),
        };

        let identity = match method {
            AuthMethod::EmailPassword { email, password } => {
                let accounts = self.accounts.read().unwrap();
                let account = accounts.get(email).ok_or_else(|| {
                    failed(
                        "auth/user-not-found",
                        "The specified user account does not exist.",
                    )
                })?;
                if &account.password != password {
                    return Err(failed("auth/wrong-password", "The password is invalid.").into());
                }
                account.identity.clone()
            }
            AuthMethod::CustomToken { token } if !token.is_empty() => Identity::new(token.clone()),
            AuthMethod::CustomToken { .. } => {
                return Err(failed("auth/invalid-custom-token", "The token is empty.").into());
            }
            AuthMethod::Credential { provider, token } if !token.is_empty() => Identity {
                uid: format!("{provider}:{token}"),
                provider_id: Some(provider.clone()),
                ..Default::default()
            },
            AuthMethod::Anonymous => {
                let n = self.next_handle.fetch_add(1, AtomicOrdering::SeqCst);
                Identity::new(format!("anonymous-{n}"))
            }
            other => {
                return Err(failed(
                    "auth/operation-not-allowed",
                    &format!("'{}' sign-in is not available in memory", other.name()),
                )
                .into());
            }
        };

        self.set_identity(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn deauthenticate(&self) -> Result<()> {
        self.check_available("deauthenticate")?;
        self.set_identity(None).await;
        Ok(())
    }

    async fn on_identity_change(&self, callback: IdentityCallback) -> Result<SubscriptionHandle> {
        let handle = self.next_handle();
        self.identity_listeners
            .lock()
            .unwrap()
            .push((handle, callback.clone()));
        let current = self.current_identity();
        callback(current).await;
        Ok(handle)
    }

    fn off_identity_change(&self, handle: SubscriptionHandle) {
        self.identity_listeners
            .lock()
            .unwrap()
            .retain(|(h, _)| *h != handle);
    }
}

fn is_prefix(prefix: &DataPath, path: &DataPath) -> bool {
    let mut path_segments = path.segments();
    prefix
        .segments()
        .all(|segment| path_segments.next() == Some(segment))
}

fn is_empty_node(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn get_at<'a>(root: &'a Json, path: &DataPath) -> Option<&'a Json> {
    path.segments().try_fold(root, |node, segment| match node {
        Json::Object(map) => map.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Writes `value` at `path`; `null` or `{}` deletes and prunes emptied parents.
fn put_at(root: &mut Json, path: &DataPath, value: Json) {
    let segs: Vec<&str> = path.segments().collect();
    if is_empty_node(&value) {
        remove_at(root, &segs);
    } else {
        set_at(root, &segs, value);
    }
}

fn set_at(node: &mut Json, segs: &[&str], value: Json) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Json::Object(Map::new());
    }
    if let Json::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Json::Null);
        set_at(child, rest, value);
    }
}

fn remove_at(node: &mut Json, segs: &[&str]) {
    let Some((head, rest)) = segs.split_first() else {
        *node = Json::Null;
        return;
    };
    let Json::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.remove(*head);
    } else if let Some(child) = map.get_mut(*head) {
        remove_at(child, rest);
        if is_empty_node(child) {
            map.remove(*head);
        }
    }
}

fn children_of(node: &Json) -> Vec<(String, Json)> {
    match node {
        Json::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Key order: integer-like keys first, numerically, then the rest lexically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn type_rank(value: &Json) -> u8 {
    match value {
        Json::Null => 0,
        Json::Bool(false) => 1,
        Json::Bool(true) => 2,
        Json::Number(_) => 3,
        Json::String(_) => 4,
        Json::Array(_) | Json::Object(_) => 5,
    }
}

/// Value order: null < false < true < numbers < strings < objects.
fn compare_values(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Json::String(x), Json::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn order_value(order: &OrderBy, value: &Json) -> Json {
    match order {
        OrderBy::Key | OrderBy::Priority => Json::Null,
        OrderBy::Value => value.clone(),
        OrderBy::Child(field) => segments(field)
            .try_fold(value, |node, segment| node.get(segment))
            .cloned()
            .unwrap_or(Json::Null),
    }
}

fn compare_to_bound(order: &OrderBy, key: &str, value: &Json, bound: &Bound) -> Ordering {
    let primary = match order {
        OrderBy::Key => compare_keys(key, &bound.value.to_string()),
        _ => compare_values(&order_value(order, value), &bound.value.to_json()),
    };
    match (&bound.priority, order) {
        (Some(priority), OrderBy::Value | OrderBy::Child(_) | OrderBy::Priority) => {
            primary.then_with(|| compare_keys(key, priority))
        }
        _ => primary,
    }
}

fn compute_view(root: &Json, query: &Query) -> View {
    let node = get_at(root, &query.path).cloned().unwrap_or(Json::Null);
    let mut children = children_of(&node);
    let order = query.order.clone().unwrap_or(OrderBy::Key);
    children.sort_by(|(ka, va), (kb, vb)| {
        compare_values(&order_value(&order, va), &order_value(&order, vb))
            .then_with(|| compare_keys(ka, kb))
    });

    if query.is_unconstrained() {
        return View {
            value: node,
            children,
        };
    }

    children.retain(|(key, value)| {
        let after_start = query
            .start_at
            .as_ref()
            .is_none_or(|b| compare_to_bound(&order, key, value, b) != Ordering::Less);
        let before_end = query
            .end_at
            .as_ref()
            .is_none_or(|b| compare_to_bound(&order, key, value, b) != Ordering::Greater);
        after_start && before_end
    });

    match query.limit {
        Some(Limit::First(n)) => children.truncate(n as usize),
        Some(Limit::Last(n)) => {
            let skip = children.len().saturating_sub(n as usize);
            children.drain(..skip);
        }
        None => {}
    }

    let value = if children.is_empty() {
        Json::Null
    } else {
        Json::Object(children.iter().cloned().collect())
    };
    View { value, children }
}

fn diff_views(listener: &Listener, old: &View, new: &View) -> Vec<Snapshot> {
    let child = |key: &str, value: &Json| Snapshot {
        key: Some(key.to_string()),
        value: value.clone(),
    };
    let old_index: HashMap<&str, (usize, &Json)> = old
        .children
        .iter()
        .enumerate()
        .map(|(i, (k, v))| (k.as_str(), (i, v)))
        .collect();
    let new_index: HashMap<&str, (usize, &Json)> = new
        .children
        .iter()
        .enumerate()
        .map(|(i, (k, v))| (k.as_str(), (i, v)))
        .collect();
    let previous_key = |children: &[(String, Json)], i: usize| -> Option<String> {
        i.checked_sub(1).map(|p| children[p].0.clone())
    };

    match listener.event {
        EventKind::Value if old.value != new.value => {
            vec![Snapshot::new(&listener.query.path, new.value.clone())]
        }
        EventKind::ChildAdded => new
            .children
            .iter()
            .filter(|(k, _)| !old_index.contains_key(k.as_str()))
            .map(|(k, v)| child(k, v))
            .collect(),
        EventKind::ChildRemoved => old
            .children
            .iter()
            .filter(|(k, _)| !new_index.contains_key(k.as_str()))
            .map(|(k, v)| child(k, v))
            .collect(),
        EventKind::ChildChanged => new
            .children
            .iter()
            .filter(|(k, v)| matches!(old_index.get(k.as_str()), Some((_, old_v)) if *old_v != v))
            .map(|(k, v)| child(k, v))
            .collect(),
        EventKind::ChildMoved => new
            .children
            .iter()
            .enumerate()
            .filter(|(i, (k, _))| match old_index.get(k.as_str()) {
                Some((old_i, _)) => {
                    previous_key(&old.children, *old_i) != previous_key(&new.children, *i)
                }
                None => false,
            })
            .map(|(_, (k, v))| child(k, v))
            .collect(),
        _ => Vec::new(),
    }
}
