//! Constants used throughout the firetree library.
//!
//! Action type names are the `type` tags of serialized [`Action`](crate::state::Action)s
//! as they travel over a JSON action channel.

pub const SET: &str = "@@firetree/SET";
pub const NO_VALUE: &str = "@@firetree/NO_VALUE";
pub const SET_PROFILE: &str = "@@firetree/SET_PROFILE";
pub const LOGIN: &str = "@@firetree/LOGIN";
pub const LOGIN_ERROR: &str = "@@firetree/LOGIN_ERROR";
pub const LOGOUT: &str = "@@firetree/LOGOUT";
pub const AUTHENTICATION_INIT_STARTED: &str = "@@firetree/AUTHENTICATION_INIT_STARTED";
pub const AUTHENTICATION_INIT_FINISHED: &str = "@@firetree/AUTHENTICATION_INIT_FINISHED";
pub const UNAUTHORIZED_ERROR: &str = "@@firetree/UNAUTHORIZED_ERROR";

/// Key under which a redirected notification carries its origin key.
pub const DEST_ID_KEY: &str = "id";

/// Key under which a redirected notification carries its value.
pub const DEST_VALUE_KEY: &str = "value";

/// Separator between a base path and its redirect destination in a watch path.
pub const DEST_SEPARATOR: char = '@';
