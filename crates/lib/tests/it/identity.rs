//! Identity binding: sign-in, sign-out and user profiles.

use firetree::{
    Action, constants,
    event::EventKind,
    remote::{AuthMethod, RemoteStore},
};
use serde_json::json;

use crate::helpers::*;

fn alice_login() -> AuthMethod {
    AuthMethod::EmailPassword {
        email: "alice@example.test".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn test_init_without_identity() {
    let (client, _remote, mut rx) = recording_client(test_config(), json!(null));
    client.init_auth().await.unwrap();

    assert_eq!(
        drain_kinds(&mut rx),
        vec![
            constants::AUTHENTICATION_INIT_STARTED,
            constants::LOGOUT,
            constants::AUTHENTICATION_INIT_FINISHED,
        ]
    );
}

#[tokio::test]
async fn test_login_mirrors_identity_and_profile() {
    let h = harness_with(
        profile_config(),
        json!({"users": {"alice": {"name": "Alice"}}}),
    );
    add_alice(&h.remote);
    h.client.init_auth().await.unwrap();
    assert_eq!(h.store.state().is_initializing, Some(false));

    let identity = h.client.login(&alice_login()).await.unwrap();
    assert_eq!(identity.uid, "alice");
    assert_eq!(h.client.auth_uid().as_deref(), Some("alice"));

    let state = h.store.state().to_json();
    assert_eq!(state["auth"]["uid"], json!("alice"));
    assert_eq!(state["auth"]["email"], json!("alice@example.test"));
    assert_eq!(state["profile"], json!({"name": "Alice"}));
    assert_eq!(state["authError"], json!(null));

    // Profile edits keep flowing in
    h.client
        .set("users/alice/name", json!("Alice B."))
        .await
        .unwrap();
    assert_eq!(h.store.state().to_json()["profile"]["name"], json!("Alice B."));
}

#[tokio::test]
async fn test_failed_login_lands_in_auth_error() {
    let h = harness(json!(null));
    add_alice(&h.remote);
    h.client.init_auth().await.unwrap();

    let err = h
        .client
        .login(&AuthMethod::EmailPassword {
            email: "alice@example.test".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());
    assert_eq!(err.code(), Some("auth/wrong-password"));

    let state = h.store.state();
    assert_eq!(state.auth, None);
    let failure = state.auth_error.expect("auth error recorded");
    assert_eq!(failure.code.as_deref(), Some("auth/wrong-password"));

    // A later successful login clears the error
    h.client.login(&alice_login()).await.unwrap();
    assert_eq!(h.store.state().auth_error, None);
}

#[tokio::test]
async fn test_login_error_is_cleared_before_each_attempt() {
    let (client, remote, mut rx) = recording_client(test_config(), json!(null));
    add_alice(&remote);

    client.login(&alice_login()).await.unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![Action::LoginError { auth_error: None }]
    );
}

#[tokio::test]
async fn test_provider_login_writes_profile() {
    let h = harness_with(profile_config(), json!(null));
    h.client.init_auth().await.unwrap();

    let identity = h
        .client
        .login(&AuthMethod::Credential {
            provider: "github".to_string(),
            token: "t0k".to_string(),
        })
        .await
        .unwrap();

    let profile_path = format!("users/{}", identity.uid);
    assert_eq!(
        h.remote.value_at(&profile_path),
        json!({"providerId": "github"})
    );
    assert_eq!(
        h.store.state().to_json()["profile"],
        json!({"providerId": "github"})
    );
}

#[tokio::test]
async fn test_unsupported_method_fails() {
    let h = harness(json!(null));
    let err = h
        .client
        .login(&AuthMethod::Popup {
            provider: "google".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("auth/operation-not-allowed"));
    assert!(h.store.state().auth_error.is_some());
}

#[tokio::test]
async fn test_denied_profile_write_dispatches_unauthorized() {
    let h = harness_with(profile_config(), json!(null));
    h.remote.deny_writes("users");

    let err = h
        .client
        .create_user_profile("alice", json!({"name": "Alice"}))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let failure = h.store.state().auth_error.expect("unauthorized recorded");
    assert_eq!(failure.code.as_deref(), Some("permission-denied"));
}

#[tokio::test]
async fn test_profile_write_merges() {
    let h = harness_with(
        profile_config(),
        json!({"users": {"alice": {"name": "Alice", "city": "Oslo"}}}),
    );
    let written = h
        .client
        .create_user_profile("alice", json!({"city": "Bergen"}))
        .await
        .unwrap();

    assert_eq!(written, Some(json!({"city": "Bergen"})));
    assert_eq!(
        h.remote.value_at("users/alice"),
        json!({"name": "Alice", "city": "Bergen"})
    );
}

#[tokio::test]
async fn test_profile_write_without_profile_root() {
    let h = harness(json!(null));
    let written = h
        .client
        .create_user_profile("alice", json!({"name": "Alice"}))
        .await
        .unwrap();
    assert_eq!(written, None);
    assert_eq!(h.remote.value_at("users/alice"), json!(null));
}

#[tokio::test]
async fn test_logout_tears_down() {
    let h = harness_with(
        profile_config(),
        json!({"users": {"alice": {"name": "Alice"}}, "rooms": {"1": "lobby"}}),
    );
    add_alice(&h.remote);
    h.client.init_auth().await.unwrap();
    h.client.login(&alice_login()).await.unwrap();
    h.client
        .watch_event(EventKind::Value, "rooms/1", None, false)
        .await
        .unwrap();
    assert_eq!(h.remote.listeners_at("users/alice", EventKind::Value), 1);

    h.client.logout().await.unwrap();

    assert_eq!(h.client.auth_uid(), None);
    assert_eq!(h.remote.current_identity(), None);
    assert_eq!(h.remote.listeners_at("users/alice", EventKind::Value), 0);

    let state = h.store.state();
    assert_eq!(state.auth, None);
    assert_eq!(state.profile, None);
    assert_eq!(state.is_loading, Some(false));
    assert_eq!(state.data_at("rooms/1"), None);
}

#[tokio::test]
async fn test_logout_failure_still_clears_local_state() {
    let h = harness(json!(null));
    add_alice(&h.remote);
    h.client.init_auth().await.unwrap();
    h.client.login(&alice_login()).await.unwrap();

    h.remote.set_unavailable(true);
    let err = h.client.logout().await.unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(h.client.auth_uid(), None);
    assert_eq!(h.store.state().auth, None);
}

#[tokio::test]
async fn test_identity_from_outside_the_client() {
    let (client, remote, mut rx) = recording_client(test_config(), json!(null));
    client.init_auth().await.unwrap();
    drain(&mut rx);

    remote
        .authenticate(&AuthMethod::CustomToken {
            token: "svc".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(drain_kinds(&mut rx), vec![constants::LOGIN]);
    assert_eq!(client.auth_uid().as_deref(), Some("svc"));

    remote.deauthenticate().await.unwrap();
    assert_eq!(drain_kinds(&mut rx), vec![constants::LOGOUT]);
}

#[tokio::test]
async fn test_dropped_client_stops_following_identity() {
    let (client, remote, mut rx) = recording_client(test_config(), json!(null));
    client.init_auth().await.unwrap();
    drain(&mut rx);
    drop(client);

    remote.authenticate(&AuthMethod::Anonymous).await.unwrap();
    assert!(drain(&mut rx).is_empty());
}
