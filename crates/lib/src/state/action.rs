//! Mutation messages folded into the state tree.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

use crate::{
    constants,
    remote::{Identity, RemoteError, Snapshot},
};

/// Keeps an explicit `null` distinct from a missing field.
fn deserialize_present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(deserializer).map(Some)
}

/// An authentication failure as recorded in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl AuthFailure {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

impl From<&RemoteError> for AuthFailure {
    fn from(err: &RemoteError) -> Self {
        AuthFailure::new(Some(err.code()), err.to_string())
    }
}

impl From<&crate::Error> for AuthFailure {
    fn from(err: &crate::Error) -> Self {
        match err {
            crate::Error::Remote(remote) => AuthFailure::from(remote),
            other => AuthFailure::new(None, other.to_string()),
        }
    }
}

/// A mutation message.
///
/// Serialized with a `type` tag so actions can be carried over a generic
/// JSON channel and read back with [`Action::from_message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Action {
    /// Store `value` at `path` under `data`, or delete the subtree when absent.
    #[serde(rename = "@@firetree/SET")]
    Set {
        path: String,
        #[serde(
            default,
            deserialize_with = "deserialize_present",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<Json>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snapshot: Option<Snapshot>,
    },

    /// Mark `path` as confirmed empty.
    #[serde(rename = "@@firetree/NO_VALUE")]
    NoValue { path: String },

    #[serde(rename = "@@firetree/SET_PROFILE")]
    SetProfile {
        #[serde(
            default,
            deserialize_with = "deserialize_present",
            skip_serializing_if = "Option::is_none"
        )]
        profile: Option<Json>,
    },

    #[serde(rename = "@@firetree/LOGIN")]
    Login { auth: Identity },

    #[serde(rename = "@@firetree/LOGIN_ERROR")]
    LoginError {
        #[serde(default)]
        auth_error: Option<AuthFailure>,
    },

    #[serde(rename = "@@firetree/LOGOUT")]
    Logout,

    #[serde(rename = "@@firetree/AUTHENTICATION_INIT_STARTED")]
    AuthenticationInitStarted,

    #[serde(rename = "@@firetree/AUTHENTICATION_INIT_FINISHED")]
    AuthenticationInitFinished,

    #[serde(rename = "@@firetree/UNAUTHORIZED_ERROR")]
    UnauthorizedError { auth_error: AuthFailure },
}

impl Action {
    /// Convenience constructor for a `Set` without a snapshot.
    pub fn set(path: impl Into<String>, value: Option<Json>) -> Self {
        Action::Set {
            path: path.into(),
            value,
            snapshot: None,
        }
    }

    /// Reads an action from a JSON message; `None` for anything unrecognized.
    pub fn from_message(message: &Json) -> Option<Action> {
        Action::deserialize(message).ok()
    }

    /// The `type` tag of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Set { .. } => constants::SET,
            Action::NoValue { .. } => constants::NO_VALUE,
            Action::SetProfile { .. } => constants::SET_PROFILE,
            Action::Login { .. } => constants::LOGIN,
            Action::LoginError { .. } => constants::LOGIN_ERROR,
            Action::Logout => constants::LOGOUT,
            Action::AuthenticationInitStarted => constants::AUTHENTICATION_INIT_STARTED,
            Action::AuthenticationInitFinished => constants::AUTHENTICATION_INIT_FINISHED,
            Action::UnauthorizedError { .. } => constants::UNAUTHORIZED_ERROR,
        }
    }
}
