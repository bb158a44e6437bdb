//! JSON Schema documents as route schemas, backed by the `jsonschema` crate.
//!
//! Unlike [`Shape`](super::Shape), a JSON Schema never rewrites the value:
//! the validated output is the input, unchanged. Issue codes follow the same
//! vocabulary as `Shape` where a keyword has an obvious counterpart, and
//! fall back to the JSON Schema keyword otherwise.

use std::fmt;

use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use jsonschema::paths::LocationSegment;
use serde_json::Value;

use super::Schema;
use crate::error::{Error, PathItem, ValidationIssue};

/// A compiled JSON Schema document.
///
/// ```rust
/// use schemaroute::schema::{JsonSchema, Schema};
/// use serde_json::json;
///
/// let schema = JsonSchema::new(json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": { "name": { "type": "string", "minLength": 1 } },
/// }))
/// .unwrap();
///
/// assert!(schema.validate(json!({ "name": "Rex" })).is_ok());
/// let issues = schema.validate(json!({})).unwrap_err();
/// assert_eq!(issues[0].message, "Required");
/// ```
pub struct JsonSchema {
    validator: Validator,
    document: Value,
}

impl JsonSchema {
    /// Compiles `document`, draft auto-detected. External `$ref`s are not
    /// fetched.
    pub fn new(document: Value) -> Result<Self, Error> {
        let validator = jsonschema::validator_for(&document)
            .map_err(|e| Error::InvalidSchema(e.to_string()))?;
        Ok(Self { validator, document })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").field("document", &self.document).finish()
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        let issues: Vec<ValidationIssue> =
            self.validator.iter_errors(&value).map(|e| issue(&e)).collect();
        if issues.is_empty() { Ok(value) } else { Err(issues) }
    }
}

fn issue(err: &jsonschema::ValidationError<'_>) -> ValidationIssue {
    let mut path: Vec<PathItem> = err
        .instance_path()
        .iter()
        .map(|segment| match segment {
            LocationSegment::Property(key) => PathItem::Key(key.into_owned()),
            LocationSegment::Index(index) => PathItem::Index(index),
        })
        .collect();

    // `required` is reported on the parent object; point at the missing key.
    if let ValidationErrorKind::Required { property } = err.kind() {
        let key = property.as_str().map_or_else(|| property.to_string(), str::to_owned);
        path.push(PathItem::Key(key));
        return ValidationIssue::new("invalid_type", "Required").at(path);
    }

    ValidationIssue::new(code(err.kind()), err.to_string()).at(path)
}

fn code(kind: &ValidationErrorKind) -> &str {
    match kind {
        ValidationErrorKind::Type { .. } => "invalid_type",
        ValidationErrorKind::AdditionalProperties { .. } => "unrecognized_keys",
        ValidationErrorKind::MinLength { .. }
        | ValidationErrorKind::MinItems { .. }
        | ValidationErrorKind::MinProperties { .. }
        | ValidationErrorKind::Minimum { .. }
        | ValidationErrorKind::ExclusiveMinimum { .. } => "too_small",
        ValidationErrorKind::MaxLength { .. }
        | ValidationErrorKind::MaxItems { .. }
        | ValidationErrorKind::MaxProperties { .. }
        | ValidationErrorKind::Maximum { .. }
        | ValidationErrorKind::ExclusiveMaximum { .. } => "too_big",
        ValidationErrorKind::Enum { .. } => "invalid_enum_value",
        ValidationErrorKind::Constant { .. } => "invalid_literal",
        ValidationErrorKind::Pattern { .. } | ValidationErrorKind::Format { .. } => "invalid_string",
        other => other.keyword(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pet() -> JsonSchema {
        JsonSchema::new(json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string", "minLength": 1 },
                "tags": { "type": "array", "items": { "type": "string" } },
            },
        }))
        .unwrap()
    }

    fn located(issues: &[ValidationIssue]) -> Vec<(&str, Vec<PathItem>)> {
        let mut out: Vec<_> = issues.iter().map(|i| (i.code.as_str(), i.path.clone())).collect();
        out.sort_by_key(|(code, path)| (format!("{path:?}"), code.to_string()));
        out
    }

    #[test]
    fn valid_values_pass_through_unchanged() {
        let value = json!({ "id": 1, "name": "Rex", "owner": "ana" });
        assert_eq!(pet().validate(value.clone()).unwrap(), value);
    }

    #[test]
    fn collects_every_issue_with_its_location() {
        let issues = pet().validate(json!({ "id": "one", "tags": ["a", 2] })).unwrap_err();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert_eq!(located(&issues), vec![
            ("invalid_type", vec![PathItem::from("id")]),
            ("invalid_type", vec![PathItem::from("name")]),
            ("invalid_type", vec![PathItem::from("tags"), PathItem::from(1usize)]),
        ]);
        let required = issues.iter().find(|i| i.path == [PathItem::from("name")]).unwrap();
        assert_eq!(required.message, "Required");
    }

    #[test]
    fn keyword_codes() {
        let strict = JsonSchema::new(json!({
            "type": "object",
            "additionalProperties": false,
            "properties": { "name": { "type": "string", "minLength": 2 } },
        }))
        .unwrap();
        let issues = strict.validate(json!({ "name": "R", "x": 1 })).unwrap_err();
        let codes: Vec<&str> = located(&issues).into_iter().map(|(code, _)| code).collect();
        assert!(codes.contains(&"too_small"), "{codes:?}");
        assert!(codes.contains(&"unrecognized_keys"), "{codes:?}");

        let even = JsonSchema::new(json!({ "type": "integer", "multipleOf": 2 })).unwrap();
        assert_eq!(even.validate(json!(3)).unwrap_err()[0].code, "multipleOf");
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = JsonSchema::new(json!({ "type": 5 })).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)), "{err}");
    }
}
