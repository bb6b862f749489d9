//! Error types for composite path parsing.

use thiserror::Error;

/// Errors produced while parsing the query part of a composite path.
///
/// These indicate a malformed path string supplied by the caller; they are
/// returned before any watcher is registered or any remote call is made.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A limit directive whose operand is not a positive integer.
    #[error("Invalid limit '{value}' for {directive} in '{path}'")]
    InvalidLimit {
        /// Directive name (`limitToFirst` or `limitToLast`)
        directive: String,
        /// The raw operand
        value: String,
        /// The full composite path
        path: String,
    },

    /// A directive that requires an operand was given none.
    #[error("Missing operand for {directive} in '{path}'")]
    MissingOperand {
        /// Directive name
        directive: String,
        /// The full composite path
        path: String,
    },
}

impl QueryError {
    /// Name of the directive that failed to parse.
    pub fn directive(&self) -> &str {
        match self {
            QueryError::InvalidLimit { directive, .. }
            | QueryError::MissingOperand { directive, .. } => directive,
        }
    }

    /// The composite path that failed to parse.
    pub fn path(&self) -> &str {
        match self {
            QueryError::InvalidLimit { path, .. } | QueryError::MissingOperand { path, .. } => path,
        }
    }
}

impl From<QueryError> for crate::Error {
    fn from(err: QueryError) -> Self {
        crate::Error::Query(err)
    }
}
