//! Slash-delimited paths into the mirrored data tree.
//!
//! Remote locations and state locations are both addressed with strings such
//! as `rooms/1/members`. [`DataPath`] is the owned, normalized form of such a
//! string: empty segments are dropped, so leading, trailing and repeated
//! slashes are all tolerated.
//!
//! ```rust
//! use firetree::path::DataPath;
//!
//! let path = DataPath::normalize("/rooms//1/");
//! assert_eq!(path.as_str(), "rooms/1");
//!
//! let child = path.push("members");
//! let segments: Vec<&str> = child.segments().collect();
//! assert_eq!(segments, vec!["rooms", "1", "members"]);
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Normalizes a path string by dropping empty segments.
///
/// - Empty string "" → empty string (refers to the root)
/// - Leading slashes "/rooms" → "rooms"
/// - Trailing slashes "rooms/" → "rooms"
/// - Repeated slashes "rooms//1" → "rooms/1"
/// - Pure slashes "///" → empty string
///
/// ```rust
/// # use firetree::path::normalize_path;
/// assert_eq!(normalize_path(""), "");
/// assert_eq!(normalize_path("/rooms"), "rooms");
/// assert_eq!(normalize_path("rooms/"), "rooms");
/// assert_eq!(normalize_path("rooms//1"), "rooms/1");
/// assert_eq!(normalize_path("///"), "");
/// ```
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    segments(input).collect::<Vec<_>>().join("/")
}

/// Splits a raw path string into its non-empty segments.
pub fn segments(input: &str) -> impl DoubleEndedIterator<Item = &str> {
    input.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

/// An owned, normalized slash-delimited path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DataPath {
    inner: String,
}

impl DataPath {
    /// Creates the root path.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a path by normalizing the input string.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Appends a path (or a single key) to the end of this path.
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if !self.inner.is_empty() {
            self.inner.push(SEPARATOR);
        }
        self.inner.push_str(&normalized);
        self
    }

    /// Returns an iterator over the segments of the path.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        segments(&self.inner)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the last segment, or `None` for the root.
    ///
    /// This is the "key" of the location, as reported in snapshots.
    pub fn key(&self) -> Option<&str> {
        self.segments().next_back()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl FromStr for DataPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for DataPath {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for DataPath {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<DataPath> for String {
    fn from(path: DataPath) -> Self {
        path.inner
    }
}

impl AsRef<str> for DataPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}
