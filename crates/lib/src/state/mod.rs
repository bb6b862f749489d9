//! The local state tree and the reducer that folds actions into it.
//!
//! [`reduce`] is pure: it never mutates the state it is given, and the state
//! it returns shares every untouched subtree with its input.
//!
//! ```rust
//! use firetree::state::{Action, initial_state, reduce};
//! use serde_json::json;
//!
//! let state = reduce(&initial_state(), &Action::set("rooms/1", Some(json!({"name": "lobby"}))));
//! assert_eq!(state.data_at("rooms/1/name"), Some(json!("lobby")));
//!
//! let state = reduce(&state, &Action::set("rooms/1", None));
//! assert_eq!(state.data_at("rooms/1"), None);
//! ```

use serde::Serialize;
use serde_json::Value as Json;

use crate::path::segments;

pub mod action;
pub mod value;

pub use action::{Action, AuthFailure};
pub use value::Value;

/// The whole local state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// The signed-in identity
    pub auth: Option<Value>,
    /// The last authentication failure
    pub auth_error: Option<AuthFailure>,
    /// The signed-in user's profile
    pub profile: Option<Value>,
    pub is_initializing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    /// Mirrored remote data
    pub data: Value,
}

impl Default for State {
    fn default() -> Self {
        initial_state()
    }
}

impl State {
    /// Mirrored data at a slash-delimited path, as JSON.
    pub fn data_at(&self, path: &str) -> Option<Json> {
        let path: Vec<&str> = segments(path).collect();
        self.data.get_in(&path).map(Value::to_json)
    }

    /// The state as plain JSON.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

/// The state before any action: nothing known and no mirrored data.
pub fn initial_state() -> State {
    State {
        auth: None,
        auth_error: None,
        profile: None,
        is_initializing: None,
        is_loading: None,
        data: Value::empty_map(),
    }
}

fn write_data(data: &Value, path: &str, value: Value) -> Value {
    let path: Vec<&str> = segments(path).collect();
    data.set_in(&path, value)
}

fn delete_data(data: &Value, path: &str) -> Value {
    let path: Vec<&str> = segments(path).collect();
    if path.is_empty() {
        return Value::empty_map();
    }
    data.delete_in(&path)
}

/// Applies one action, returning the next state.
pub fn reduce(state: &State, action: &Action) -> State {
    match action {
        Action::Set {
            path,
            value: Some(value),
            ..
        } => State {
            data: write_data(&state.data, path, Value::from_json(value)),
            ..state.clone()
        },
        Action::Set {
            path, value: None, ..
        } => State {
            data: delete_data(&state.data, path),
            ..state.clone()
        },
        Action::NoValue { path } => State {
            data: write_data(&state.data, path, Value::empty_map()),
            ..state.clone()
        },
        Action::SetProfile { profile } => State {
            profile: profile.as_ref().map(Value::from_json),
            ..state.clone()
        },
        Action::Logout => State {
            auth: None,
            auth_error: None,
            profile: None,
            is_initializing: None,
            is_loading: Some(false),
            data: Value::empty_map(),
        },
        Action::Login { auth } => State {
            auth: Some(Value::from_json(&auth.to_json())),
            auth_error: None,
            ..state.clone()
        },
        Action::LoginError { auth_error } => State {
            auth_error: auth_error.clone(),
            auth: None,
            profile: None,
            ..state.clone()
        },
        Action::AuthenticationInitStarted => State {
            is_initializing: Some(true),
            ..initial_state()
        },
        Action::AuthenticationInitFinished => State {
            is_initializing: Some(false),
            ..state.clone()
        },
        Action::UnauthorizedError { auth_error } => State {
            auth_error: Some(auth_error.clone()),
            ..state.clone()
        },
    }
}

/// Applies a JSON message. Unrecognized messages leave the state unchanged.
pub fn reduce_message(state: &State, message: &Json) -> State {
    match Action::from_message(message) {
        Some(action) => reduce(state, &action),
        None => state.clone(),
    }
}
