//! Route definitions.
//!
//! A route is declared in two steps, spec first, then handler:
//!
//! ```rust
//! use schemaroute::{BoxError, Method, RouteSpec, schema::{object, string}};
//! use serde_json::Value;
//!
//! # fn main() -> Result<(), schemaroute::Error> {
//! let get_pet = RouteSpec::new(
//!     Method::Get,
//!     "/pets/:id",
//!     object([("id", string())]),
//!     object([("id", string()), ("name", string())]),
//! )?
//! .handler(|input: Value| async move {
//!     Ok::<_, BoxError>(serde_json::json!({ "id": input["id"], "name": "Rex" }))
//! });
//! assert_eq!(get_pet.spec().path().as_str(), "/pets/:id");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::path::PathPattern;
use crate::schema::Schema;

/// Method, path and the two schemas of a route. Immutable once built.
#[derive(Clone)]
pub struct RouteSpec {
    method: Method,
    path: PathPattern,
    input: Arc<dyn Schema>,
    output: Arc<dyn Schema>,
}

impl RouteSpec {
    /// Fails with [`Error::InvalidPattern`] if `path` does not parse.
    pub fn new(
        method: Method,
        path: &str,
        input: impl Schema,
        output: impl Schema,
    ) -> Result<Self, Error> {
        Ok(Self {
            method,
            path: PathPattern::parse(path)?,
            input: Arc::new(input),
            output: Arc::new(output),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    pub fn input_schema(&self) -> &dyn Schema {
        &*self.input
    }

    pub fn output_schema(&self) -> &dyn Schema {
        &*self.output
    }

    /// Binds the handler, producing a registrable [`Route`].
    pub fn handler<Args>(self, handler: impl Handler<Args>) -> Route {
        Route { spec: self, handler: handler.into_boxed_handler() }
    }
}

impl fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path.as_str())
            .finish_non_exhaustive()
    }
}

/// A [`RouteSpec`] with its handler attached.
pub struct Route {
    spec: RouteSpec,
    handler: BoxedHandler,
}

impl Route {
    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("spec", &self.spec).finish_non_exhaustive()
    }
}
