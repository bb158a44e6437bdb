//! Error types.
//!
//! Two layers. [`ValidationError`] is the per-request, client-visible failure:
//! a schema rejected a value and the issues go back over the wire intact.
//! [`Error`] is everything the crate can fail with, including registration
//! mistakes caught at startup and opaque handler failures that must never
//! reach the client verbatim.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::method::Method;

/// A boxed, thread-safe error as returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by the crate's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered route matched the method + path. Terminal, `404`.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// A route equivalent to an already registered one was added.
    #[error("route {method} {pattern} conflicts with already registered {existing}")]
    DuplicateRoute {
        method: Method,
        pattern: String,
        existing: String,
    },

    /// A path pattern could not be parsed.
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    /// A JSON Schema document failed to compile.
    #[error("invalid JSON Schema: {0}")]
    InvalidSchema(String),

    /// Input or output failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `context::current()` was called outside of any request scope.
    #[error("no request context is active on this task")]
    NoActiveContext,

    /// A handler failed. The inner error is for server-side logs only.
    #[error("handler failed: {0}")]
    Handler(BoxError),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status this error maps to at the dispatcher boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Which side of the handler a validation failure happened on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The request did not satisfy the route's input schema. Client fault.
    Input,
    /// The handler returned data violating its own output schema. Server fault.
    Output,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step into a validated value: an object key or an array index.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathItem {
    Index(usize),
    Key(String),
}

impl From<&str> for PathItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathItem {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathItem {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single field-level validation failure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    /// Location of the offending value. Empty for the root.
    pub path: Vec<PathItem>,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), path: Vec::new() }
    }

    pub fn at(mut self, path: impl IntoIterator<Item = PathItem>) -> Self {
        self.path = path.into_iter().collect();
        self
    }
}

/// A schema rejected either the request input or the handler output.
///
/// `Display` and `Error` are implemented by hand: thiserror would treat the
/// `source` field as the underlying cause.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub source: Source,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn input(issues: Vec<ValidationIssue>) -> Self {
        Self { source: Source::Input, issues }
    }

    pub fn output(issues: Vec<ValidationIssue>) -> Self {
        Self { source: Source::Output, issues }
    }

    /// `400` for input failures, `500` for output failures.
    pub fn status(&self) -> StatusCode {
        match self.source {
            Source::Input => StatusCode::BAD_REQUEST,
            Source::Output => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failed with {} issue(s)", self.source, self.issues.len())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_source() {
        assert_eq!(ValidationError::input(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ValidationError::output(vec![]).status(), StatusCode::INTERNAL_SERVER_ERROR);
        let not_found = Error::RouteNotFound { method: "GET".into(), path: "/x".into() };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::NoActiveContext.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn issue_serializes_mixed_path() {
        let issue = ValidationIssue::new("invalid_type", "Required")
            .at([PathItem::from("items"), PathItem::from(2usize), PathItem::from("name")]);
        let json = serde_json::to_value(ValidationError::output(vec![issue])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source": "output",
                "issues": [{ "code": "invalid_type", "message": "Required", "path": ["items", 2, "name"] }]
            })
        );
    }
}
