//! Validate → invoke → validate.
//!
//! [`execute`] is the whole contract between a request and a handler:
//!
//! 1. the raw input is validated against the route's input schema, and on
//!    failure the handler is never called;
//! 2. the handler runs with the validated value;
//! 3. whatever it returns is validated against the output schema, even
//!    though the handler already finished;
//! 4. the caller receives the output schema's representation of the value,
//!    not the handler's raw return value.
//!
//! Nothing here touches the transport. Errors are returned, and the
//! dispatcher maps them to a response in exactly one place.

use serde_json::{Map, Value};

use crate::error::{BoxError, Error, ValidationError, ValidationIssue};
use crate::path::Params;
use crate::route::Route;
use crate::schema::type_name;

/// Runs one request through `route`.
///
/// Must be called inside the request's context scope
/// ([`run_with_context`](crate::context::run_with_context)) when the handler
/// uses [`context::current`](crate::context::current).
pub async fn execute(route: &Route, raw_input: Value) -> Result<Value, Error> {
    let spec = route.spec();

    let input = spec
        .input_schema()
        .validate(raw_input)
        .map_err(ValidationError::input)?;

    let output = route.handler().call(input).await.map_err(from_handler)?;

    let output = spec
        .output_schema()
        .validate(output)
        .map_err(ValidationError::output)?;

    Ok(output)
}

/// Classifies a handler failure.
///
/// A `ValidationError` (bare or as [`Error::Validation`]) keeps its source
/// and status, and [`Error::NoActiveContext`] stays distinct for logging.
/// Every other failure, crate errors such as `RouteNotFound` included,
/// becomes an opaque [`Error::Handler`].
fn from_handler(err: BoxError) -> Error {
    let err = match err.downcast::<ValidationError>() {
        Ok(validation) => return Error::Validation(*validation),
        Err(err) => err,
    };
    match err.downcast::<Error>() {
        Ok(err) => match *err {
            Error::Validation(validation) => Error::Validation(validation),
            Error::NoActiveContext => Error::NoActiveContext,
            Error::Handler(inner) => Error::Handler(inner),
            other => Error::Handler(Box::new(other)),
        },
        Err(err) => Error::Handler(err),
    }
}

/// Builds a route's raw input from the pieces of a request.
///
/// Later sources win on key collision: query, then body, then path
/// parameters. A body that is not a JSON object is passed through as-is
/// when there is nothing to merge it with.
pub fn merge_input(
    params: &Params,
    query: Map<String, Value>,
    body: Option<Value>,
) -> Result<Value, ValidationError> {
    let mut merged = query;

    match body {
        None | Some(Value::Null) => {}
        Some(Value::Object(body)) => merged.extend(body),
        Some(other) if merged.is_empty() && params.is_empty() => return Ok(other),
        Some(other) => {
            let message = format!("Expected object, received {}", type_name(&other));
            return Err(ValidationError::input(vec![ValidationIssue::new("invalid_type", message)]));
        }
    }

    for (name, value) in params.iter() {
        merged.insert(name.to_owned(), Value::String(value.to_owned()));
    }
    Ok(Value::Object(merged))
}
