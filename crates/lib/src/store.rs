//! Dispatch targets for mutation messages.
//!
//! [`Dispatch`] is the action channel the subscription driver and the
//! identity binding write into. [`Store`] is the standard target: it folds
//! every action through [`reduce`] and publishes the resulting state on a
//! `tokio::sync::watch` channel, so observers always see the latest state.

use std::sync::Arc;

use handle_trait::Handle;
use serde_json::Value as Json;
use tokio::sync::{mpsc, watch};
use tracing::{trace, warn};

use crate::state::{Action, State, initial_state, reduce};

/// Something that accepts mutation messages.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, action: Action);
}

/// Forwards actions into an unbounded channel; actions sent after the
/// receiver is gone are dropped with a warning.
impl Dispatch for mpsc::UnboundedSender<Action> {
    fn dispatch(&self, action: Action) {
        if let Err(err) = self.send(action) {
            warn!(action = err.0.kind(), "action channel closed, dropping action");
        }
    }
}

/// Holds the current [`State`] and applies dispatched actions to it.
///
/// `Store` is a cheap-to-clone handle; clones share the same state.
///
/// ```rust
/// use firetree::{state::Action, store::{Dispatch, Store}};
/// use serde_json::json;
///
/// let store = Store::new();
/// store.dispatch(Action::set("rooms/1", Some(json!("lobby"))));
/// assert_eq!(store.data_at("rooms/1"), Some(json!("lobby")));
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Store {
    inner: Arc<watch::Sender<State>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a store holding the initial state.
    pub fn new() -> Self {
        Self::with_state(initial_state())
    }

    /// Creates a store holding `state`.
    pub fn with_state(state: State) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            inner: Arc::new(sender),
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> State {
        self.inner.borrow().clone()
    }

    /// Mirrored data at a path in the current state.
    pub fn data_at(&self, path: &str) -> Option<Json> {
        self.inner.borrow().data_at(path)
    }

    /// A receiver notified whenever an action changes the state.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.inner.subscribe()
    }
}

impl Dispatch for Store {
    fn dispatch(&self, action: Action) {
        trace!(action = action.kind(), "reducing action");
        self.inner.send_if_modified(|state| {
            let next = reduce(state, &action);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
    }
}
