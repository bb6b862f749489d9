//! Event kinds a watcher can listen for.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of remote notification a watcher listens for.
///
/// All kinds except [`EventKind::FirstChild`] map onto a live remote
/// listener. `FirstChild` is a one-shot existence check: it reads the first
/// child of a location once and never holds a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The whole value at the location
    Value,
    /// A child appeared (fires once per existing child on attach)
    ChildAdded,
    /// A child's value changed
    ChildChanged,
    /// A child disappeared
    ChildRemoved,
    /// A child's position in the query order changed
    ChildMoved,
    /// One-shot emptiness check
    FirstChild,
}

impl EventKind {
    /// Every event kind, in declaration order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Value,
        EventKind::ChildAdded,
        EventKind::ChildChanged,
        EventKind::ChildRemoved,
        EventKind::ChildMoved,
        EventKind::FirstChild,
    ];

    /// Wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Value => "value",
            EventKind::ChildAdded => "child_added",
            EventKind::ChildChanged => "child_changed",
            EventKind::ChildRemoved => "child_removed",
            EventKind::ChildMoved => "child_moved",
            EventKind::FirstChild => "first_child",
        }
    }

    /// Whether watching this kind attaches a live remote listener.
    pub fn is_live(&self) -> bool {
        !matches!(self, EventKind::FirstChild)
    }

    /// Whether notifications of this kind are about a single child.
    pub fn is_child_event(&self) -> bool {
        matches!(
            self,
            EventKind::ChildAdded
                | EventKind::ChildChanged
                | EventKind::ChildRemoved
                | EventKind::ChildMoved
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event kind name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl From<UnknownEventKind> for crate::Error {
    fn from(err: UnknownEventKind) -> Self {
        crate::Error::UnknownEvent(err)
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}
