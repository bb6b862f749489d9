//! Attaching, translating and detaching remote listeners.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{ActionSink, Client};
use crate::{
    Result,
    constants::{DEST_ID_KEY, DEST_SEPARATOR, DEST_VALUE_KEY},
    event::EventKind,
    query,
    remote::{OrderBy, Query, Snapshot, SnapshotCallback},
    state::Action,
    watcher::{Listener, Unset},
};

/// One entry of a batch watch or unwatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSpec {
    /// Event kind to watch
    pub name: EventKind,
    /// Composite path, optionally carrying a query
    pub path: String,
}

impl WatchSpec {
    pub fn new(name: EventKind, path: impl Into<String>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }
}

/// Turns one remote notification into a `Set` action.
///
/// Removals carry no value. Value events and redirected watches write at
/// the base path; other child events write at `base/key`. A redirected
/// watch wraps each value together with the key it came from.
pub(crate) fn notification_action(
    event: EventKind,
    base_path: &str,
    dest: Option<&str>,
    snapshot: Snapshot,
) -> Action {
    let key = snapshot.key.clone().unwrap_or_default();
    let path = if dest.is_none() && event.is_child_event() {
        format!("{base_path}/{key}")
    } else {
        base_path.to_string()
    };

    let value = match (event, dest) {
        (EventKind::ChildRemoved, _) => None,
        (_, Some(_)) => Some(json!({ DEST_ID_KEY: key, DEST_VALUE_KEY: snapshot.value.clone() })),
        (_, None) => Some(snapshot.value.clone()),
    };

    Action::Set {
        path,
        value,
        snapshot: Some(snapshot),
    }
}

fn notification_callback(
    sink: ActionSink,
    event: EventKind,
    base_path: String,
    dest: Option<String>,
) -> SnapshotCallback {
    Arc::new(move |snapshot| {
        sink.send(notification_action(
            event,
            &base_path,
            dest.as_deref(),
            snapshot,
        ))
    })
}

impl Client {
    /// Watches `event` at a composite path.
    ///
    /// The first watch of a watch-id attaches a remote listener; later
    /// watches only add a holder. With `only_last_event`, a repeated watch
    /// replaces the previous listener and all of its holders when the path
    /// names a query, and is dropped otherwise. `first_child` reads the
    /// first child once and marks the path as empty when there is none,
    /// without attaching anything.
    ///
    /// `dest` redirects every notification to the base path, tagged with the
    /// key it came from.
    pub async fn watch_event(
        &self,
        event: EventKind,
        path: &str,
        dest: Option<&str>,
        only_last_event: bool,
    ) -> Result<()> {
        let parsed = query::parse(path)?;
        let base_path = parsed.base_path.as_str();
        let query_id = parsed.query_id.as_deref();
        let watch_path = match dest {
            Some(dest) => format!("{base_path}{DEST_SEPARATOR}{dest}"),
            None => base_path.to_string(),
        };

        let watchers = &self.inner.watchers;
        let count = watchers
            .get_watcher_count(event, &watch_path, query_id)
            .unwrap_or(0);
        if count > 0 && only_last_event {
            match query_id {
                Some(query_id) => {
                    debug!(%event, path, "replacing previous query listener");
                    let taken = watchers.take_watcher(event, &watch_path, Some(query_id));
                    self.detach(taken);
                }
                None => {
                    debug!(%event, path, "already watched, dropping repeated watch");
                    return Ok(());
                }
            }
        }
        let holders = watchers.set_watcher(event, &watch_path, query_id);

        if !event.is_live() {
            let snapshot = match self
                .inner
                .remote
                .read_ordered(base_path, OrderBy::Key, 1)
                .await
            {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    watchers.unset_watcher(event, &watch_path, query_id);
                    return Err(err);
                }
            };
            if snapshot.is_empty() {
                self.dispatch(Action::NoValue {
                    path: base_path.to_string(),
                });
            }
            return Ok(());
        }
        if holders > 1 {
            debug!(%event, path, holders, "listener already attached");
            return Ok(());
        }

        let remote_query = Query::from_directives(base_path, &parsed.directives);
        let callback = notification_callback(
            self.sink(),
            event,
            base_path.to_string(),
            dest.map(str::to_string),
        );
        let handle = match self
            .inner
            .remote
            .subscribe(&remote_query, event, callback)
            .await
        {
            Ok(handle) => handle,
            Err(err) => {
                watchers.unset_watcher(event, &watch_path, query_id);
                return Err(err);
            }
        };

        let listener = Listener {
            path: base_path.to_string(),
            event,
            handle,
        };
        if !watchers.attach_listener(event, &watch_path, query_id, listener) {
            debug!(%event, path, "watch released during attach, detaching");
            self.inner.remote.unsubscribe(base_path, event, handle);
        }
        Ok(())
    }

    /// Releases one holder of a watch; the last holder detaches its listeners.
    ///
    /// `path` is the same composite path given to `watch_event` (with
    /// `@dest` appended for redirected watches). Unwatching something that
    /// is not watched does nothing.
    pub fn unwatch_event(&self, event: EventKind, path: &str, query_id: Option<&str>) {
        let unset = self.inner.watchers.unset_watcher(event, path, query_id);
        self.detach(unset);
    }

    fn detach(&self, unset: Unset) {
        if let Unset::Removed(listeners) = unset {
            for listener in listeners {
                self.inner
                    .remote
                    .unsubscribe(&listener.path, listener.event, listener.handle);
            }
        }
    }

    /// Watches every entry, in order, stopping at the first failure.
    pub async fn watch_events(&self, specs: &[WatchSpec]) -> Result<()> {
        for spec in specs {
            self.watch_event(spec.name, &spec.path, None, false).await?;
        }
        Ok(())
    }

    /// Unwatches every entry.
    pub fn unwatch_events(&self, specs: &[WatchSpec]) {
        for spec in specs {
            self.unwatch_event(spec.name, &spec.path, None);
        }
    }
}
