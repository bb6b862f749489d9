//! The per-instance handle tying config, remote store, registry and state together.
//!
//! A [`Client`] owns one [`WatcherRegistry`], so independent clients never
//! share watch counts. Everything it observes is turned into [`Action`]s and
//! handed to its dispatch target, typically a [`Store`](crate::store::Store).
//!
//! ## Example
//!
//! ```
//! # use std::sync::Arc;
//! # use firetree::{Client, config::Config, event::EventKind, remote::InMemory, store::Store};
//! # use serde_json::json;
//! # #[tokio::main]
//! # async fn main() -> firetree::Result<()> {
//! let config = Config::builder()
//!     .database_url("memory://demo")
//!     .auth_domain("demo.test")
//!     .api_key("demo")
//!     .build()?;
//! let remote = Arc::new(InMemory::with_data(json!({"rooms": {"1": {"name": "lobby"}}})));
//! let store = Store::new();
//! let client = Client::new(config, remote, Arc::new(store.clone()))?;
//!
//! client.watch_event(EventKind::Value, "rooms/1", None, false).await?;
//! assert_eq!(store.data_at("rooms/1/name"), Some(json!("lobby")));
//!
//! client.unwatch_event(EventKind::Value, "rooms/1", None);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, Weak};

use handle_trait::Handle;
use tracing::debug;

use crate::{
    Result,
    config::Config,
    remote::{RemoteStore, SubscriptionHandle},
    state::Action,
    store::Dispatch,
    watcher::{Listener, WatcherRegistry},
};

mod auth;
pub mod errors;
mod helpers;
mod watch;

pub use errors::ClientError;
pub use watch::WatchSpec;

/// Where the client sends its actions.
#[derive(Clone)]
pub(crate) struct ActionSink {
    dispatcher: Arc<dyn Dispatch>,
    log_actions: bool,
}

impl ActionSink {
    pub(crate) fn send(&self, action: Action) {
        if self.log_actions {
            debug!(action = action.kind(), ?action, "dispatching action");
        }
        self.dispatcher.dispatch(action);
    }
}

/// Identity-related bookkeeping.
#[derive(Debug, Default)]
struct AuthState {
    uid: Option<String>,
    profile_listener: Option<Listener>,
    identity_handle: Option<SubscriptionHandle>,
}

/// Internal state for Client
///
/// Client itself is a cheap-to-clone handle wrapping `Arc<ClientInternal>`.
pub(crate) struct ClientInternal {
    config: Config,
    remote: Arc<dyn RemoteStore>,
    sink: ActionSink,
    watchers: WatcherRegistry,
    auth: Mutex<AuthState>,
}

impl std::fmt::Debug for ClientInternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInternal")
            .field("config", &self.config)
            .field("remote", &"<RemoteStore>")
            .field("watchers", &self.watchers)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Binds a remote store to a dispatch target.
#[derive(Clone, Debug, Handle)]
pub struct Client {
    inner: Arc<ClientInternal>,
}

/// Weak reference to a Client.
///
/// Callbacks registered with the remote store hold this instead of a
/// `Client`, so the store does not keep the client alive.
#[derive(Clone, Debug, Handle)]
pub struct WeakClient {
    inner: Weak<ClientInternal>,
}

impl Client {
    /// Creates a client after validating `config`.
    ///
    /// Nothing is attached until [`watch_event`](Self::watch_event) or
    /// [`init_auth`](Self::init_auth) is called.
    pub fn new(
        config: Config,
        remote: Arc<dyn RemoteStore>,
        dispatcher: Arc<dyn Dispatch>,
    ) -> Result<Self> {
        config.validate()?;
        let sink = ActionSink {
            dispatcher,
            log_actions: config.enable_logging,
        };
        Ok(Self {
            inner: Arc::new(ClientInternal {
                config,
                remote,
                sink,
                watchers: WatcherRegistry::new(),
                auth: Mutex::new(AuthState::default()),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// This client's watcher registry.
    pub fn watchers(&self) -> &WatcherRegistry {
        &self.inner.watchers
    }

    /// Uid of the identity last reported by the remote store.
    pub fn auth_uid(&self) -> Option<String> {
        self.inner.auth.lock().unwrap().uid.clone()
    }

    /// Sends an action to the dispatch target.
    pub fn dispatch(&self, action: Action) {
        self.inner.sink.send(action);
    }

    pub(crate) fn sink(&self) -> ActionSink {
        self.inner.sink.clone()
    }

    /// Downgrade to a weak reference.
    pub fn downgrade(&self) -> WeakClient {
        WeakClient {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl WeakClient {
    /// Upgrade to a strong reference, or `None` once the client is dropped.
    pub fn upgrade(&self) -> Option<Client> {
        self.inner.upgrade().map(|inner| Client { inner })
    }
}
