use std::sync::Arc;

use firetree::{
    Action, Client, Store,
    config::Config,
    remote::{Identity, InMemory},
};
use serde_json::Value as Json;
use tokio::sync::mpsc;

// Re-export tokio test macro for convenience
pub use tokio;

/// A client wired to an in-memory remote and a reducing store.
pub struct Harness {
    pub client: Client,
    pub remote: Arc<InMemory>,
    pub store: Store,
}

pub fn test_config() -> Config {
    Config::builder()
        .database_url("memory://test")
        .auth_domain("test.local")
        .api_key("test-key")
        .build()
        .expect("test config is valid")
}

pub fn profile_config() -> Config {
    Config {
        user_profile: Some("users".to_string()),
        ..test_config()
    }
}

/// Builds a harness around a remote seeded with `data`.
pub fn harness_with(config: Config, data: Json) -> Harness {
    let remote = Arc::new(InMemory::with_data(data));
    let store = Store::new();
    let client = Client::new(config, remote.clone(), Arc::new(store.clone()))
        .expect("Failed to create client");
    Harness {
        client,
        remote,
        store,
    }
}

pub fn harness(data: Json) -> Harness {
    harness_with(test_config(), data)
}

/// Builds a client that records every action into a channel instead of reducing it.
pub fn recording_client(
    config: Config,
    data: Json,
) -> (Client, Arc<InMemory>, mpsc::UnboundedReceiver<Action>) {
    let remote = Arc::new(InMemory::with_data(data));
    let (tx, rx) = mpsc::unbounded_channel();
    let client = Client::new(config, remote.clone(), Arc::new(tx)).expect("Failed to create client");
    (client, remote, rx)
}

/// Everything received so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Action>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}

/// The `type` tags of everything received so far.
pub fn drain_kinds(rx: &mut mpsc::UnboundedReceiver<Action>) -> Vec<&'static str> {
    drain(rx).iter().map(Action::kind).collect()
}

/// Registers `alice@example.test` / `hunter2` as uid `alice`.
pub fn add_alice(remote: &InMemory) {
    remote.add_account(
        "alice@example.test",
        "hunter2",
        Identity::new("alice").with_email("alice@example.test"),
    );
}
