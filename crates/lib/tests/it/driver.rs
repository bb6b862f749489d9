//! Watching and unwatching through a client: listener lifetimes, notification
//! translation and the one-shot `first_child` read.

use firetree::{
    Action,
    client::WatchSpec,
    event::EventKind,
    remote::RemoteStore,
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_listener_lives_while_any_watch_holds_it() {
    let h = harness(json!({"rooms": {"1": {"name": "lobby"}}}));

    h.client
        .watch_event(EventKind::Value, "rooms/1", None, false)
        .await
        .unwrap();
    h.client
        .watch_event(EventKind::Value, "rooms/1", None, false)
        .await
        .unwrap();
    assert_eq!(h.remote.listeners_at("rooms/1", EventKind::Value), 1);
    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "rooms/1", None),
        Some(2)
    );

    h.client.unwatch_event(EventKind::Value, "rooms/1", None);
    assert_eq!(h.remote.listeners_at("rooms/1", EventKind::Value), 1);
    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "rooms/1", None),
        Some(1)
    );

    h.client.unwatch_event(EventKind::Value, "rooms/1", None);
    assert_eq!(h.remote.listeners_at("rooms/1", EventKind::Value), 0);
    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "rooms/1", None),
        None
    );
}

#[tokio::test]
async fn test_repeated_watch_delivers_each_change_once() {
    let (client, remote, mut rx) = recording_client(test_config(), json!(null));
    client
        .watch_event(EventKind::ChildAdded, "rooms", None, false)
        .await
        .unwrap();
    client
        .watch_event(EventKind::ChildAdded, "rooms", None, false)
        .await
        .unwrap();
    assert_eq!(remote.listeners_at("rooms", EventKind::ChildAdded), 1);

    remote.write("rooms/r1", json!({"name": "lobby"})).await.unwrap();
    assert_eq!(drain(&mut rx).len(), 1);

    client.unwatch_event(EventKind::ChildAdded, "rooms", None);
    remote.write("rooms/r2", json!({"name": "hall"})).await.unwrap();
    assert_eq!(drain(&mut rx).len(), 1);

    client.unwatch_event(EventKind::ChildAdded, "rooms", None);
    remote.write("rooms/r3", json!({"name": "attic"})).await.unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_value_watch_follows_remote_changes() {
    let h = harness(json!({"rooms": {"1": {"name": "lobby"}}}));
    h.client
        .watch_event(EventKind::Value, "rooms/1", None, false)
        .await
        .unwrap();
    assert_eq!(h.store.data_at("rooms/1/name"), Some(json!("lobby")));

    h.client.set("rooms/1/name", json!("hall")).await.unwrap();
    assert_eq!(h.store.data_at("rooms/1/name"), Some(json!("hall")));

    h.client.remove("rooms/1").await.unwrap();
    assert_eq!(h.store.data_at("rooms/1"), Some(json!(null)));

    // Detached: later writes are not mirrored
    h.client.unwatch_event(EventKind::Value, "rooms/1", None);
    h.client.set("rooms/1/name", json!("attic")).await.unwrap();
    assert_eq!(h.store.data_at("rooms/1"), Some(json!(null)));
}

#[tokio::test]
async fn test_child_events_write_below_the_base_path() {
    let h = harness(json!({"todos": {"a": {"done": false}}}));
    for event in [
        EventKind::ChildAdded,
        EventKind::ChildChanged,
        EventKind::ChildRemoved,
    ] {
        h.client.watch_event(event, "todos", None, false).await.unwrap();
    }
    assert_eq!(h.store.data_at("todos/a/done"), Some(json!(false)));

    h.client.set("todos/b", json!({"done": false})).await.unwrap();
    assert_eq!(h.store.data_at("todos/b/done"), Some(json!(false)));

    h.client.set("todos/a/done", json!(true)).await.unwrap();
    assert_eq!(h.store.data_at("todos/a/done"), Some(json!(true)));

    h.client.remove("todos/a").await.unwrap();
    assert_eq!(h.store.data_at("todos/a"), None);
    assert_eq!(h.store.data_at("todos/b/done"), Some(json!(false)));
}

#[tokio::test]
async fn test_dest_wraps_values_with_their_key() {
    let (client, remote, mut rx) = recording_client(test_config(), json!(null));
    client
        .watch_event(EventKind::ChildAdded, "rooms/1", Some("joined"), false)
        .await
        .unwrap();
    assert!(drain(&mut rx).is_empty());

    remote
        .write("rooms/1/u7", json!({"name": "Bo"}))
        .await
        .unwrap();

    let actions = drain(&mut rx);
    assert_eq!(actions.len(), 1);
    let Action::Set { path, value, .. } = &actions[0] else {
        panic!("expected a Set, got {:?}", actions[0]);
    };
    assert_eq!(path, "rooms/1");
    assert_eq!(
        value.as_ref(),
        Some(&json!({"id": "u7", "value": {"name": "Bo"}}))
    );

    // The redirected watch is counted separately from a plain one
    assert_eq!(
        client
            .watchers()
            .get_watcher_count(EventKind::ChildAdded, "rooms/1@joined", None),
        Some(1)
    );
    assert_eq!(
        client
            .watchers()
            .get_watcher_count(EventKind::ChildAdded, "rooms/1", None),
        None
    );
    client.unwatch_event(EventKind::ChildAdded, "rooms/1@joined", None);
    assert_eq!(remote.listener_count(), 0);
}

#[tokio::test]
async fn test_first_child_marks_empty_paths() {
    let (client, remote, mut rx) = recording_client(test_config(), json!({"full": {"a": 1}}));

    client
        .watch_event(EventKind::FirstChild, "empty", None, false)
        .await
        .unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![Action::NoValue {
            path: "empty".to_string()
        }]
    );

    client
        .watch_event(EventKind::FirstChild, "full", None, false)
        .await
        .unwrap();
    assert!(drain(&mut rx).is_empty());

    // One-shot: nothing stays attached, but the watch is still counted
    assert_eq!(remote.listener_count(), 0);
    assert_eq!(
        client
            .watchers()
            .get_watcher_count(EventKind::FirstChild, "full", None),
        Some(1)
    );
}

#[tokio::test]
async fn test_first_child_empty_path_lands_as_empty_map() {
    let h = harness(json!(null));
    h.client
        .watch_event(EventKind::FirstChild, "inbox", None, false)
        .await
        .unwrap();
    assert_eq!(h.store.data_at("inbox"), Some(json!({})));
}

#[tokio::test]
async fn test_only_last_event_replaces_named_query() {
    let h = harness(json!({"scores": {"a": 1, "b": 2, "c": 3}}));
    h.client
        .watch_event(
            EventKind::Value,
            "scores#queryId=top&orderByValue&limitToFirst=1",
            None,
            true,
        )
        .await
        .unwrap();
    assert_eq!(h.store.data_at("scores"), Some(json!({"a": 1})));

    h.client
        .watch_event(
            EventKind::Value,
            "scores#queryId=top&orderByValue&limitToLast=1",
            None,
            true,
        )
        .await
        .unwrap();

    assert_eq!(h.remote.listeners_at("scores", EventKind::Value), 1);
    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "scores", Some("top")),
        Some(1)
    );
    assert_eq!(h.store.data_at("scores"), Some(json!({"c": 3})));

    // Only the newer listener is still mirrored
    h.client.set("scores/a", json!(0)).await.unwrap();
    assert_eq!(h.store.data_at("scores"), Some(json!({"c": 3})));
}

#[tokio::test]
async fn test_only_last_event_drops_repeated_plain_watch() {
    let h = harness(json!({"rooms": {"1": "lobby"}}));
    h.client
        .watch_event(EventKind::Value, "rooms", None, true)
        .await
        .unwrap();
    h.client
        .watch_event(EventKind::Value, "rooms", None, true)
        .await
        .unwrap();

    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "rooms", None),
        Some(1)
    );
    assert_eq!(h.remote.listeners_at("rooms", EventKind::Value), 1);
}

#[tokio::test]
async fn test_unwatch_of_unknown_watch_is_a_no_op() {
    let h = harness(json!({"rooms": {"1": "lobby"}}));
    h.client
        .watch_event(EventKind::Value, "rooms", None, false)
        .await
        .unwrap();

    h.client.unwatch_event(EventKind::ChildAdded, "rooms", None);
    h.client.unwatch_event(EventKind::Value, "elsewhere", None);

    assert_eq!(h.remote.listener_count(), 1);
    assert_eq!(h.client.watchers().len(), 1);
}

#[tokio::test]
async fn test_failed_subscribe_leaves_no_watch() {
    let h = harness(json!({"rooms": {"1": "lobby"}}));
    h.remote.set_unavailable(true);

    let err = h
        .client
        .watch_event(EventKind::Value, "rooms", None, false)
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
    assert!(h.client.watchers().is_empty());

    let err = h
        .client
        .watch_event(EventKind::FirstChild, "rooms", None, false)
        .await
        .unwrap_err();
    assert!(err.is_remote_error());
    assert!(h.client.watchers().is_empty());

    h.remote.set_unavailable(false);
    h.client
        .watch_event(EventKind::Value, "rooms", None, false)
        .await
        .unwrap();
    assert_eq!(h.store.data_at("rooms/1"), Some(json!("lobby")));
}

#[tokio::test]
async fn test_batch_watch_and_unwatch() {
    let h = harness(json!({"a": 1, "b": {"x": 2}}));
    let specs = vec![
        WatchSpec::new(EventKind::Value, "a"),
        WatchSpec::new(EventKind::ChildAdded, "b"),
    ];

    h.client.watch_events(&specs).await.unwrap();
    assert_eq!(h.remote.listener_count(), 2);
    assert_eq!(h.store.data_at("a"), Some(json!(1)));
    assert_eq!(h.store.data_at("b/x"), Some(json!(2)));

    h.client.unwatch_events(&specs);
    assert_eq!(h.remote.listener_count(), 0);
    assert!(h.client.watchers().is_empty());
}

#[tokio::test]
async fn test_clients_do_not_share_watch_counts() {
    let first = harness(json!({"a": 1}));
    let second = harness(json!({"a": 1}));

    first
        .client
        .watch_event(EventKind::Value, "a", None, false)
        .await
        .unwrap();
    assert_eq!(
        second
            .client
            .watchers()
            .get_watcher_count(EventKind::Value, "a", None),
        None
    );
}

#[tokio::test]
async fn test_replacing_query_drops_every_previous_holder() {
    let h = harness(json!({"scores": {"a": 1, "b": 2, "c": 3}}));
    for _ in 0..2 {
        h.client
            .watch_event(
                EventKind::Value,
                "scores#queryId=top&orderByValue&limitToFirst=1",
                None,
                false,
            )
            .await
            .unwrap();
    }
    h.client
        .watch_event(
            EventKind::Value,
            "scores#queryId=top&orderByValue&limitToLast=1",
            None,
            true,
        )
        .await
        .unwrap();

    assert_eq!(h.remote.listeners_at("scores", EventKind::Value), 1);
    assert_eq!(
        h.client
            .watchers()
            .get_watcher_count(EventKind::Value, "scores", Some("top")),
        Some(1)
    );
    assert_eq!(h.store.data_at("scores"), Some(json!({"c": 3})));
}
