//! JSON client for a schemaroute server.
//!
//! Speaks the same wire contract the dispatcher writes: JSON in, JSON out,
//! errors in the `{"error": ...}` envelope.
//!
//! ```rust,no_run
//! use schemaroute::ApiClient;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Pet { id: String, name: String }
//!
//! # async fn run() -> Result<(), schemaroute::ClientError> {
//! let client = ApiClient::new("http://localhost:5000");
//! let pet: Pet = client.post("/pets", &serde_json::json!({ "name": "Eloise" })).await?;
//! let again: Pet = client.get(&format!("/pets/{}", pet.id)).await?;
//! assert_eq!(again.name, "Eloise");
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::ValidationError;
use crate::method::Method;
use crate::response::{ErrorBody, ErrorPayload};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the input or its own output.
    #[error(transparent)]
    Validation(ValidationError),

    /// Any other non-2xx response.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A client bound to one base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, http: reqwest::Client::new() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<O: DeserializeOwned>(&self, path: &str) -> Result<O, ClientError> {
        self.request::<(), O>(Method::Get, path, None).await
    }

    pub async fn post<I, O>(&self, path: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.request(Method::Post, path, Some(input)).await
    }

    /// Sends `input` (if any) as the JSON body and decodes the reply.
    pub async fn request<I, O>(
        &self,
        method: Method,
        path: &str,
        input: Option<&I>,
    ) -> Result<O, ClientError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.into(), url);
        if let Some(input) = input {
            req = req.json(input);
        }

        let res = req.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(ErrorBody { error: ErrorPayload::Validation(v) }) => Err(ClientError::Validation(v)),
            Ok(ErrorBody { error: ErrorPayload::Message { message } }) => {
                Err(ClientError::Status { status: status.as_u16(), message })
            }
            Err(_) => Err(ClientError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_owned(),
            }),
        }
    }
}
