//! # schemaroute
//!
//! Declarative, schema-checked HTTP routes for Rust services.
//!
//! ## The contract
//!
//! A route is a method, a path, an input schema, an output schema and a
//! handler. For every request the dispatcher:
//!
//! 1. matches method + path, binding `:name` segments;
//! 2. merges query, JSON body and path parameters (path parameters win);
//! 3. validates the merged input, so the handler never sees invalid data;
//! 4. runs the handler with per-request [`context`] ambient;
//! 5. validates the handler's output and sends the schema's representation
//!    of it, never the raw return value.
//!
//! Input failures are the client's fault (`400`), output failures are the
//! server's (`500`). Both carry the full list of issues:
//!
//! ```json
//! { "error": { "source": "output", "issues": [{ "code": "invalid_type", "message": "Required", "path": ["name"] }] } }
//! ```
//!
//! What schemaroute does not do: middleware, streaming bodies, auth, content
//! negotiation. Put those in front of it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use schemaroute::schema::{object, string};
//! use schemaroute::{BoxError, Dispatcher, Method, RouteSpec, Router, Server, context};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct NewPet { name: String }
//!
//! #[derive(Serialize)]
//! struct Pet { id: String, name: String }
//!
//! async fn create_pet(input: NewPet) -> Result<Pet, BoxError> {
//!     context::current()?.set_status(StatusCode::CREATED);
//!     Ok(Pet { id: "1".into(), name: input.name })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), schemaroute::Error> {
//!     let router = Router::new().route(
//!         RouteSpec::new(
//!             Method::Post,
//!             "/pets",
//!             object([("name", string())]),
//!             object([("id", string()), ("name", string())]),
//!         )?
//!         .handler(create_pet),
//!     )?;
//!
//!     Server::bind("0.0.0.0:5000")?.serve(Dispatcher::new(router)).await
//! }
//! ```

mod client;
mod dispatcher;
mod error;
mod handler;
mod method;
mod path;
mod response;
mod route;
mod router;
mod server;

pub mod context;
pub mod pipeline;
pub mod schema;

pub use client::{ApiClient, ClientError};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, Error, PathItem, Source, ValidationError, ValidationIssue};
pub use handler::Handler;
pub use method::Method;
pub use path::{Params, PathPattern, Segment};
pub use response::{ErrorBody, ErrorPayload, Response};
pub use route::{Route, RouteSpec};
pub use router::{Matched, Router};
pub use server::Server;
