//! The schema capability.
//!
//! The pipeline treats a schema as a black box: a value goes in, and either
//! a (possibly transformed) value or a list of issues comes out. Three
//! implementations ship with the crate:
//!
//! - [`Shape`]: a small structural validator in the spirit of zod. Strips
//!   unknown object keys, can coerce path-parameter strings into numbers.
//! - [`Typed`]: validates by round-tripping through a serde type.
//! - [`JsonSchema`]: a JSON Schema document, checked by the `jsonschema`
//!   crate. Values pass through unchanged.
//!
//! Anything else plugs in by implementing [`Schema`] or wrapping a closure
//! with [`from_fn`].

mod json_schema;
mod shape;
mod typed;

use std::sync::Arc;

use serde_json::Value;

use crate::error::ValidationIssue;

pub use json_schema::JsonSchema;
pub use shape::{Shape, any, array, boolean, integer, number, object, string};
pub use typed::Typed;

/// Validates a raw JSON value.
///
/// On success returns the schema's own representation of the value, which is
/// what downstream consumers see. On failure returns every issue found.
pub trait Schema: Send + Sync + 'static {
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>>;
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        (**self).validate(value)
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        (**self).validate(value)
    }
}

/// Wraps a closure as a [`Schema`].
///
/// ```rust
/// use schemaroute::{ValidationIssue, schema::{self, Schema}};
/// use serde_json::{Value, json};
///
/// let even = schema::from_fn(|v: Value| match v.as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v),
///     _ => Err(vec![ValidationIssue::new("custom", "Expected an even number")]),
/// });
/// assert!(even.validate(json!(4)).is_ok());
/// assert!(even.validate(json!(3)).is_err());
/// ```
pub fn from_fn<F>(f: F) -> FnSchema<F>
where
    F: Fn(Value) -> Result<Value, Vec<ValidationIssue>> + Send + Sync + 'static,
{
    FnSchema(f)
}

/// A [`Schema`] backed by a closure. See [`from_fn`].
pub struct FnSchema<F>(F);

impl<F> Schema for FnSchema<F>
where
    F: Fn(Value) -> Result<Value, Vec<ValidationIssue>> + Send + Sync + 'static,
{
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        (self.0)(value)
    }
}

/// JSON type name used in `Expected X, received Y` messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
