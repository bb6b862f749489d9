//! Folding JSON messages into state.

use firetree::{
    Action, Store,
    state::{State, initial_state, reduce_message},
    store::Dispatch,
};
use serde_json::{Value as Json, json};

fn fold(messages: &[Json]) -> State {
    messages
        .iter()
        .fold(initial_state(), |state, message| reduce_message(&state, message))
}

#[test]
fn test_set_then_read_back() {
    let state = fold(&[json!({
        "type": "@@firetree/SET",
        "path": "rooms/1",
        "value": {"name": "lobby", "members": {"u1": true}}
    })]);
    assert_eq!(state.data_at("rooms/1/members/u1"), Some(json!(true)));
}

#[test]
fn test_set_without_value_deletes_only_the_subtree() {
    let state = fold(&[
        json!({"type": "@@firetree/SET", "path": "a/b", "value": 1}),
        json!({"type": "@@firetree/SET", "path": "a/c", "value": 2}),
        json!({"type": "@@firetree/SET", "path": "a/b"}),
    ]);
    assert_eq!(state.data_at("a/b"), None);
    assert_eq!(state.data_at("a/c"), Some(json!(2)));
}

#[test]
fn test_explicit_null_is_stored() {
    let state = fold(&[
        json!({"type": "@@firetree/SET", "path": "a", "value": 1}),
        json!({"type": "@@firetree/SET", "path": "a", "value": null}),
    ]);
    assert_eq!(state.data_at("a"), Some(Json::Null));
}

#[test]
fn test_untouched_siblings_are_shared() {
    let before = fold(&[
        json!({"type": "@@firetree/SET", "path": "left/deep", "value": {"x": 1}}),
        json!({"type": "@@firetree/SET", "path": "right", "value": 2}),
    ]);
    let after = reduce_message(
        &before,
        &json!({"type": "@@firetree/SET", "path": "right", "value": 3}),
    );

    let left_before = before.data.get("left").unwrap();
    let left_after = after.data.get("left").unwrap();
    assert!(left_before.ptr_eq(left_after));
    assert_eq!(before.data_at("right"), Some(json!(2)));
}

#[test]
fn test_writes_into_a_list_keep_its_elements() {
    let state = fold(&[
        json!({"type": "@@firetree/SET", "path": "l", "value": ["a", "b"]}),
        json!({"type": "@@firetree/SET", "path": "l/2", "value": "c"}),
    ]);
    assert_eq!(state.data_at("l"), Some(json!(["a", "b", "c"])));

    let state = reduce_message(
        &state,
        &json!({"type": "@@firetree/SET", "path": "l/9/name", "value": "z"}),
    );
    assert_eq!(state.data_at("l/0"), Some(json!("a")));
    assert_eq!(state.data_at("l/2"), Some(json!("c")));
    assert_eq!(state.data_at("l/9/name"), Some(json!("z")));
}

#[test]
fn test_no_value_marks_empty() {
    let state = fold(&[json!({"type": "@@firetree/NO_VALUE", "path": "inbox/u1"})]);
    assert_eq!(state.data_at("inbox/u1"), Some(json!({})));
}

#[test]
fn test_unrecognized_messages_leave_state_alone() {
    let state = fold(&[json!({"type": "@@firetree/SET", "path": "a", "value": 1})]);
    for message in [
        json!({"type": "SOMETHING_ELSE", "path": "a"}),
        json!({"path": "a", "value": 2}),
        json!("not an object"),
    ] {
        assert_eq!(reduce_message(&state, &message), state);
    }
}

#[test]
fn test_auth_lifecycle_messages() {
    let state = fold(&[
        json!({"type": "@@firetree/AUTHENTICATION_INIT_STARTED"}),
        json!({"type": "@@firetree/AUTHENTICATION_INIT_FINISHED"}),
        json!({"type": "@@firetree/LOGIN", "auth": {"uid": "u1", "email": "u1@example.test"}}),
        json!({"type": "@@firetree/SET_PROFILE", "profile": {"name": "Una"}}),
        json!({"type": "@@firetree/SET", "path": "rooms/1", "value": true}),
    ]);
    assert_eq!(state.is_initializing, Some(false));
    let json = state.to_json();
    assert_eq!(json["auth"]["uid"], json!("u1"));
    assert_eq!(json["profile"]["name"], json!("Una"));

    let state = reduce_message(&state, &json!({"type": "@@firetree/LOGOUT"}));
    assert_eq!(state.auth, None);
    assert_eq!(state.profile, None);
    assert_eq!(state.is_loading, Some(false));
    assert_eq!(state.data_at("rooms/1"), None);
}

#[test]
fn test_login_error_records_failure() {
    let state = fold(&[
        json!({"type": "@@firetree/LOGIN", "auth": {"uid": "u1"}}),
        json!({
            "type": "@@firetree/LOGIN_ERROR",
            "authError": {"code": "auth/wrong-password", "message": "bad password"}
        }),
    ]);
    assert_eq!(state.auth, None);
    let failure = state.auth_error.unwrap();
    assert_eq!(failure.code.as_deref(), Some("auth/wrong-password"));
}

#[tokio::test]
async fn test_store_observers_wait_for_data() {
    let store = Store::new();
    let mut rx = store.subscribe();

    let writer = store.clone();
    let task = tokio::spawn(async move {
        for n in 1..=3 {
            writer.dispatch(Action::set("counter", Some(json!(n))));
        }
    });

    let state = rx
        .wait_for(|state| state.data_at("counter") == Some(json!(3)))
        .await
        .unwrap()
        .clone();
    task.await.unwrap();
    assert_eq!(state.data_at("counter"), Some(json!(3)));
}
