//! Reference-counted registry of active watches.
//!
//! Every watch is identified by a watch-id derived from its event kind, its
//! path and its optional query id. The registry counts how many callers hold
//! each watch-id and remembers the remote listeners attached for it, so that
//! the last `unset_watcher` for an id hands back exactly the listeners that
//! must be detached.
//!
//! A registry is owned by one [`Client`](crate::client::Client). Each
//! operation holds the registry lock for its whole read-modify-write.

use std::{collections::HashMap, sync::Mutex};

use tracing::debug;

use crate::{
    event::EventKind,
    query::{query_id_from_path, strip_query},
    remote::SubscriptionHandle,
};

/// Derives the watch-id for an event, path and optional query id.
///
/// ```rust
/// # use firetree::{event::EventKind, watcher::watch_id};
/// assert_eq!(watch_id(EventKind::Value, "rooms/1", None), "value:/rooms/1");
/// assert_eq!(watch_id(EventKind::Value, "/rooms/1", None), "value:/rooms/1");
/// assert_eq!(watch_id(EventKind::ChildAdded, "rooms", Some("Q1")), "child_added:/Q1");
/// ```
pub fn watch_id(event: EventKind, path: &str, query_id: Option<&str>) -> String {
    match query_id {
        Some(query_id) => format!("{event}:/{query_id}"),
        None if path.starts_with('/') => format!("{event}:{path}"),
        None => format!("{event}:/{path}"),
    }
}

/// A live remote listener attached on behalf of a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    /// Base path the listener was attached at
    pub path: String,
    pub event: EventKind,
    pub handle: SubscriptionHandle,
}

#[derive(Debug, Default)]
struct WatcherEntry {
    count: usize,
    listeners: Vec<Listener>,
}

/// Result of [`WatcherRegistry::unset_watcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unset {
    /// Other holders remain; carries the new count.
    Decremented(usize),
    /// The last holder left. The listeners must be detached.
    Removed(Vec<Listener>),
    /// Nothing was registered under the id.
    NotWatched,
}

/// Watch-id → reference count and attached listeners.
#[derive(Debug, Default)]
pub struct WatcherRegistry {
    entries: Mutex<HashMap<String, WatcherEntry>>,
}

impl WatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more holder of a watch and returns the new count.
    pub fn set_watcher(&self, event: EventKind, path: &str, query_id: Option<&str>) -> usize {
        let id = watch_id(event, path, query_id);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(id.clone()).or_default();
        entry.count += 1;
        debug!(watch_id = %id, count = entry.count, "watcher set");
        entry.count
    }

    /// Current number of holders, or `None` when nothing is registered.
    pub fn get_watcher_count(
        &self,
        event: EventKind,
        path: &str,
        query_id: Option<&str>,
    ) -> Option<usize> {
        let id = watch_id(event, path, query_id);
        self.entries.lock().unwrap().get(&id).map(|entry| entry.count)
    }

    /// Releases one holder of a watch.
    ///
    /// Without an explicit `query_id` the id is re-derived from `path`,
    /// query syntax included, before the query suffix is stripped. This
    /// targets the same watch-id `set_watcher` computed for the composite
    /// path.
    pub fn unset_watcher(&self, event: EventKind, path: &str, query_id: Option<&str>) -> Unset {
        let derived = match query_id {
            Some(query_id) => Some(query_id.to_string()),
            None => query_id_from_path(path),
        };
        let id = watch_id(event, strip_query(path), derived.as_deref());

        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(&id) else {
            debug!(watch_id = %id, "unset on a watcher that is not registered");
            return Unset::NotWatched;
        };

        if entry.count > 1 {
            entry.count -= 1;
            debug!(watch_id = %id, count = entry.count, "watcher released");
            return Unset::Decremented(entry.count);
        }

        let entry = entries.remove(&id).unwrap_or_default();
        debug!(watch_id = %id, listeners = entry.listeners.len(), "watcher removed");
        if event.is_live() {
            Unset::Removed(entry.listeners)
        } else {
            Unset::Removed(Vec::new())
        }
    }

    /// Drops every holder of a watch at once, returning its listeners.
    ///
    /// Used when a newer watch replaces the old one outright.
    pub fn take_watcher(&self, event: EventKind, path: &str, query_id: Option<&str>) -> Unset {
        let id = watch_id(event, path, query_id);
        match self.entries.lock().unwrap().remove(&id) {
            Some(entry) => {
                debug!(watch_id = %id, holders = entry.count, "watcher taken");
                Unset::Removed(entry.listeners)
            }
            None => Unset::NotWatched,
        }
    }

    /// Records a listener attached for a watch.
    ///
    /// Returns `false` when the watch was torn down while the attach was in
    /// flight; the caller must then detach the listener itself.
    pub fn attach_listener(
        &self,
        event: EventKind,
        path: &str,
        query_id: Option<&str>,
        listener: Listener,
    ) -> bool {
        let id = watch_id(event, path, query_id);
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(&id) {
            Some(entry) => {
                entry.listeners.push(listener);
                true
            }
            None => false,
        }
    }

    /// Number of registered watch-ids.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered watch-ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}
