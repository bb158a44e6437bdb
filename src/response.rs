//! Outgoing response type and the JSON error body.
//!
//! Every response the dispatcher produces is JSON. Success bodies are the
//! validated handler output; failures use one envelope:
//!
//! ```json
//! { "error": { "source": "input", "issues": [{ "code": "...", "message": "...", "path": ["name"] }] } }
//! { "error": { "message": "Not Found" } }
//! ```

use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, ValidationError};

// ── ErrorBody ─────────────────────────────────────────────────────────────────

/// Wire form of every error response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Issues are forwarded verbatim, for input and output failures alike.
    Validation(ValidationError),
    /// Everything else carries only the status' reason phrase.
    Message { message: String },
}

impl ErrorBody {
    /// Builds the body for `err`. Only validation errors expose details.
    pub fn from_error(err: &Error) -> Self {
        let error = match err {
            Error::Validation(v) => ErrorPayload::Validation(v.clone()),
            other => ErrorPayload::Message { message: reason(other.status()).to_owned() },
        };
        Self { error }
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Error")
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing response.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Serializes `body` as `application/json`.
    ///
    /// Serialization of a `serde_json::Value` cannot fail; for other types a
    /// failure degrades to a bodiless `500`.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Self { status, headers, body: Bytes::from(bytes) }
            }
            Err(_) => Self::empty(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Response with no body.
    pub fn empty(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// The error envelope for `err`, with the status it maps to.
    pub fn from_error(err: &Error) -> Self {
        Self::json(err.status(), &ErrorBody::from_error(err))
    }

    /// Adds headers, keeping `content-type` as set by the constructor.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            if name != CONTENT_TYPE {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body back as JSON. `Value::Null` for an empty body.
    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Converts into the `http` response handed to hyper.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}
