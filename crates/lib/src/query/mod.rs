//! Composite path strings and the query directives they encode.
//!
//! A watch path may carry a query after a `#`:
//!
//! ```text
//! path        := basePath ["#" query]
//! query       := param ("&" param)*
//! param       := name "=" value [ ("," | "=") priority ]
//! ```
//!
//! Params are applied strictly left to right. `orderByValue`,
//! `orderByPriority` and `orderByKey` switch off numeric coercion for every
//! range or equality operand that follows them, so the same operand text can
//! produce different directives depending on its position.
//!
//! ```rust
//! use firetree::query::{parse, QueryDirective, QueryValue};
//!
//! let parsed = parse("scores#orderByChild=score&startAt=5").unwrap();
//! assert_eq!(parsed.base_path, "scores");
//! assert!(parsed.is_query);
//! assert_eq!(parsed.directives[0], QueryDirective::OrderByChild("score".into()));
//! assert_eq!(parsed.directives[1].bound().unwrap().value, QueryValue::Int(5));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;

pub use errors::QueryError;

/// Separates the base path from the query.
pub const QUERY_SEPARATOR: char = '#';
/// Separates params within the query.
pub const PARAM_SEPARATOR: char = '&';
/// Separates a param name from its operands.
pub const OPERAND_SEPARATOR: char = '=';
/// Param name that overrides the derived watch-id.
pub const QUERY_ID_PARAM: &str = "queryId";
/// Operand text that is read as the null value.
pub const NULL_OPERAND: &str = "null";

/// An operand of a range or equality directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// The literal `null`
    Null,
    /// A numeric-coerced operand
    Int(i64),
    /// A raw string operand
    Text(String),
}

impl QueryValue {
    /// Reads an operand, coercing it to an integer when `coerce` is set.
    ///
    /// Only a whole base-10 integer coerces; there is no lenient prefix
    /// parse, so `"3.7"` and `"5abc"` stay text. `null` is the null value
    /// whatever the coercion mode.
    pub fn from_operand(raw: &str, coerce: bool) -> Self {
        if raw == NULL_OPERAND {
            return QueryValue::Null;
        }
        if coerce && let Ok(n) = raw.parse::<i64>() {
            return QueryValue::Int(n);
        }
        QueryValue::Text(raw.to_string())
    }

    /// Converts the operand into a JSON value for comparison against data.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QueryValue::Null => serde_json::Value::Null,
            QueryValue::Int(n) => serde_json::Value::from(*n),
            QueryValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => f.write_str(NULL_OPERAND),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

/// Operands of `equalTo`, `startAt` and `endAt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bound {
    /// Primary operand compared against the ordering value
    pub value: QueryValue,
    /// Optional secondary operand, compared against child keys on ties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl Bound {
    /// Creates a bound without a secondary operand.
    pub fn new(value: QueryValue) -> Self {
        Self {
            value,
            priority: None,
        }
    }

    /// Adds a secondary operand.
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.priority {
            Some(priority) => write!(f, "{}{OPERAND_SEPARATOR}{priority}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// One query-shaping instruction from a composite path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "operand", rename_all = "camelCase")]
pub enum QueryDirective {
    OrderByValue,
    OrderByPriority,
    OrderByKey,
    OrderByChild(String),
    LimitToFirst(u32),
    LimitToLast(u32),
    EqualTo(Bound),
    StartAt(Bound),
    EndAt(Bound),
}

impl QueryDirective {
    /// The param name this directive is written with.
    pub fn name(&self) -> &'static str {
        match self {
            QueryDirective::OrderByValue => "orderByValue",
            QueryDirective::OrderByPriority => "orderByPriority",
            QueryDirective::OrderByKey => "orderByKey",
            QueryDirective::OrderByChild(_) => "orderByChild",
            QueryDirective::LimitToFirst(_) => "limitToFirst",
            QueryDirective::LimitToLast(_) => "limitToLast",
            QueryDirective::EqualTo(_) => "equalTo",
            QueryDirective::StartAt(_) => "startAt",
            QueryDirective::EndAt(_) => "endAt",
        }
    }

    /// Returns the bound of a range or equality directive.
    pub fn bound(&self) -> Option<&Bound> {
        match self {
            QueryDirective::EqualTo(bound)
            | QueryDirective::StartAt(bound)
            | QueryDirective::EndAt(bound) => Some(bound),
            _ => None,
        }
    }
}

impl fmt::Display for QueryDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            QueryDirective::OrderByValue
            | QueryDirective::OrderByPriority
            | QueryDirective::OrderByKey => f.write_str(name),
            QueryDirective::OrderByChild(field) => write!(f, "{name}={field}"),
            QueryDirective::LimitToFirst(n) | QueryDirective::LimitToLast(n) => {
                write!(f, "{name}={n}")
            }
            QueryDirective::EqualTo(bound)
            | QueryDirective::StartAt(bound)
            | QueryDirective::EndAt(bound) => write!(f, "{name}={bound}"),
        }
    }
}

/// The result of parsing a composite path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPath {
    /// Everything before the first `#`
    pub base_path: String,
    /// Explicit `queryId`, or the whole composite path for an unnamed query
    pub query_id: Option<String>,
    /// Directives in the order they appeared
    pub directives: Vec<QueryDirective>,
    /// Whether the path carried a `#` query part
    pub is_query: bool,
}

/// Splits a composite path at the first `#`.
fn split_query(path: &str) -> (&str, Option<&str>) {
    match path.split_once(QUERY_SEPARATOR) {
        Some((base, query)) => (base, Some(query)),
        None => (path, None),
    }
}

/// Returns the base path of a composite path (everything before the first `#`).
pub fn strip_query(path: &str) -> &str {
    split_query(path).0
}

/// Derives the query id of a composite path.
///
/// The first `queryId=X` param wins; a query without one is identified by
/// the whole composite string, so two differently written queries are never
/// coalesced. A plain path has no query id.
///
/// ```rust
/// # use firetree::query::query_id_from_path;
/// assert_eq!(query_id_from_path("a#queryId=Q1&limitToFirst=2"), Some("Q1".to_string()));
/// assert_eq!(query_id_from_path("a#limitToFirst=2"), Some("a#limitToFirst=2".to_string()));
/// assert_eq!(query_id_from_path("a/b"), None);
/// ```
pub fn query_id_from_path(path: &str) -> Option<String> {
    let (_, query) = split_query(path);
    let query = query?;

    let explicit = query.split(PARAM_SEPARATOR).find_map(|param| {
        let mut parts = param.split(OPERAND_SEPARATOR);
        match (parts.next(), parts.next()) {
            (Some(QUERY_ID_PARAM), Some(id)) if !id.is_empty() => Some(id.to_string()),
            _ => None,
        }
    });

    Some(explicit.unwrap_or_else(|| path.to_string()))
}

/// Left-to-right directive reader.
///
/// Carries the coercion mode, which the ordering directives switch off for
/// the rest of the query.
struct DirectiveReader<'a> {
    path: &'a str,
    coerce_values: bool,
}

impl<'a> DirectiveReader<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            coerce_values: true,
        }
    }

    fn missing(&self, name: &str) -> QueryError {
        QueryError::MissingOperand {
            directive: name.to_string(),
            path: self.path.to_string(),
        }
    }

    fn limit(&self, name: &str, value: Option<&str>) -> Result<u32, QueryError> {
        let value = value.ok_or_else(|| self.missing(name))?;
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(QueryError::InvalidLimit {
                directive: name.to_string(),
                value: value.to_string(),
                path: self.path.to_string(),
            }),
        }
    }

    fn bound(
        &self,
        name: &str,
        value: Option<&str>,
        priority: Option<&str>,
    ) -> Result<Bound, QueryError> {
        let value = value.ok_or_else(|| self.missing(name))?;
        let (value, priority) = match priority {
            Some(priority) => (value, Some(priority)),
            None => match value.split_once(',') {
                Some((value, priority)) => (value, Some(priority)),
                None => (value, None),
            },
        };

        Ok(Bound {
            value: QueryValue::from_operand(value, self.coerce_values),
            priority: priority.map(str::to_string),
        })
    }

    /// Reads one param. Unknown names (including `queryId`) yield `None`.
    fn read(&mut self, param: &str) -> Result<Option<QueryDirective>, QueryError> {
        let mut parts = param.split(OPERAND_SEPARATOR);
        let name = parts.next().unwrap_or_default();
        let value = parts.next();
        let priority = parts.next();

        let directive = match name {
            "orderByValue" => {
                self.coerce_values = false;
                QueryDirective::OrderByValue
            }
            "orderByPriority" => {
                self.coerce_values = false;
                QueryDirective::OrderByPriority
            }
            "orderByKey" => {
                self.coerce_values = false;
                QueryDirective::OrderByKey
            }
            "orderByChild" => match value {
                Some(field) if !field.is_empty() => QueryDirective::OrderByChild(field.to_string()),
                _ => return Err(self.missing(name)),
            },
            "limitToFirst" => QueryDirective::LimitToFirst(self.limit(name, value)?),
            "limitToLast" => QueryDirective::LimitToLast(self.limit(name, value)?),
            "equalTo" => QueryDirective::EqualTo(self.bound(name, value, priority)?),
            "startAt" => QueryDirective::StartAt(self.bound(name, value, priority)?),
            "endAt" => QueryDirective::EndAt(self.bound(name, value, priority)?),
            _ => return Ok(None),
        };
        Ok(Some(directive))
    }
}

/// Parses a composite path into its base path, query id and directives.
pub fn parse(path: &str) -> Result<ParsedPath, QueryError> {
    let (base_path, query) = split_query(path);
    let Some(query) = query else {
        return Ok(ParsedPath {
            base_path: base_path.to_string(),
            query_id: None,
            directives: Vec::new(),
            is_query: false,
        });
    };

    let mut reader = DirectiveReader::new(path);
    let mut directives = Vec::new();
    for param in query.split(PARAM_SEPARATOR) {
        if let Some(directive) = reader.read(param)? {
            directives.push(directive);
        }
    }

    Ok(ParsedPath {
        base_path: base_path.to_string(),
        query_id: query_id_from_path(path),
        directives,
        is_query: true,
    })
}
