//! Structural schemas built from combinators.
//!
//! ```rust
//! use schemaroute::schema::{Schema, array, integer, object, string};
//! use serde_json::json;
//!
//! let pet = object([
//!     ("id", integer().coerce()),
//!     ("name", string().min_len(1)),
//!     ("tags", array(string()).optional()),
//! ]);
//!
//! let value = pet.validate(json!({ "id": "7", "name": "Rex", "owner": "ana" })).unwrap();
//! assert_eq!(value, json!({ "id": 7, "name": "Rex" }));
//! ```

use serde_json::{Map, Number, Value};

use super::{Schema, type_name};
use crate::error::{PathItem, ValidationIssue};

#[derive(Clone, Debug)]
enum Kind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<Shape>),
    Object { fields: Vec<(String, Shape)>, strict: bool },
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object { .. } => "object",
        }
    }
}

/// A structural schema. Build one with the free functions in this module.
#[derive(Clone, Debug)]
pub struct Shape {
    kind: Kind,
    optional: bool,
    nullable: bool,
    coerce: bool,
    min_len: Option<usize>,
}

fn shape(kind: Kind) -> Shape {
    Shape { kind, optional: false, nullable: false, coerce: false, min_len: None }
}

/// Accepts any value unchanged.
pub fn any() -> Shape {
    shape(Kind::Any)
}

pub fn string() -> Shape {
    shape(Kind::String)
}

pub fn number() -> Shape {
    shape(Kind::Number)
}

pub fn integer() -> Shape {
    shape(Kind::Integer)
}

pub fn boolean() -> Shape {
    shape(Kind::Boolean)
}

pub fn array(item: Shape) -> Shape {
    shape(Kind::Array(Box::new(item)))
}

/// An object with the given fields. Keys not listed are dropped from the
/// output unless the shape is made [`strict`](Shape::strict).
pub fn object<I, K>(fields: I) -> Shape
where
    I: IntoIterator<Item = (K, Shape)>,
    K: Into<String>,
{
    let fields = fields.into_iter().map(|(k, s)| (k.into(), s)).collect();
    shape(Kind::Object { fields, strict: false })
}

impl Shape {
    /// As an object field: may be absent. Absent fields stay absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accepts `null` in addition to the shape itself.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Converts strings into numbers, integers and booleans, and scalars into
    /// strings, before checking. Path parameters always arrive as strings.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Minimum length in characters (strings) or elements (arrays).
    pub fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    /// Rejects unknown keys instead of stripping them. No effect on
    /// non-object shapes.
    pub fn strict(mut self) -> Self {
        if let Kind::Object { strict, .. } = &mut self.kind {
            *strict = true;
        }
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    fn check(
        &self,
        value: Value,
        path: &mut Vec<PathItem>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        if value.is_null() && self.nullable {
            return Some(Value::Null);
        }
        let value = if self.coerce { coerce(&self.kind, value) } else { value };

        match (&self.kind, value) {
            (Kind::Any, value) => Some(value),
            (Kind::String, Value::String(s)) => {
                let len = s.chars().count();
                if self.min_len.is_some_and(|min| len < min) {
                    self.too_small(len, "character", path, issues);
                }
                Some(Value::String(s))
            }
            (Kind::Number, Value::Number(n)) => Some(Value::Number(n)),
            (Kind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(Value::Number(n)),
            (Kind::Integer, Value::Number(_)) => {
                push(issues, path, "invalid_type", "Expected integer, received float".to_owned());
                None
            }
            (Kind::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
            (Kind::Array(item), Value::Array(items)) => {
                if self.min_len.is_some_and(|min| items.len() < min) {
                    self.too_small(items.len(), "element", path, issues);
                }
                let mut out = Vec::with_capacity(items.len());
                let mut ok = true;
                for (i, value) in items.into_iter().enumerate() {
                    path.push(PathItem::Index(i));
                    match item.check(value, path, issues) {
                        Some(v) => out.push(v),
                        None => ok = false,
                    }
                    path.pop();
                }
                ok.then_some(Value::Array(out))
            }
            (Kind::Object { fields, strict }, Value::Object(mut map)) => {
                let mut out = Map::new();
                let mut ok = true;
                for (key, field) in fields {
                    path.push(PathItem::Key(key.clone()));
                    match map.remove(key) {
                        Some(value) => match field.check(value, path, issues) {
                            Some(v) => {
                                out.insert(key.clone(), v);
                            }
                            None => ok = false,
                        },
                        None if field.optional => {}
                        None => {
                            push(issues, path, "invalid_type", "Required".to_owned());
                            ok = false;
                        }
                    }
                    path.pop();
                }
                if *strict && !map.is_empty() {
                    let keys: Vec<String> = map.keys().map(|k| format!("'{k}'")).collect();
                    let message = format!("Unrecognized key(s) in object: {}", keys.join(", "));
                    push(issues, path, "unrecognized_keys", message);
                    ok = false;
                }
                ok.then_some(Value::Object(out))
            }
            (kind, other) => {
                let message = format!("Expected {}, received {}", kind.name(), type_name(&other));
                push(issues, path, "invalid_type", message);
                None
            }
        }
    }

    fn too_small(
        &self,
        len: usize,
        unit: &str,
        path: &[PathItem],
        issues: &mut Vec<ValidationIssue>,
    ) {
        let min = self.min_len.unwrap_or_default();
        let message = format!("Expected at least {min} {unit}(s), received {len}");
        push(issues, path, "too_small", message);
    }
}

impl Schema for Shape {
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let out = self.check(value, &mut Vec::new(), &mut issues);
        match out {
            Some(value) if issues.is_empty() => Ok(value),
            _ => Err(issues),
        }
    }
}

fn push(issues: &mut Vec<ValidationIssue>, path: &[PathItem], code: &str, message: String) {
    issues.push(ValidationIssue { code: code.to_owned(), message, path: path.to_vec() });
}

fn coerce(kind: &Kind, value: Value) -> Value {
    match (kind, value) {
        (Kind::Number, Value::String(s)) => {
            let trimmed = s.trim();
            let number = exact_integer(trimmed)
                .or_else(|| trimmed.parse::<f64>().ok().and_then(Number::from_f64));
            match number {
                Some(n) => Value::Number(n),
                None => Value::String(s),
            }
        }
        (Kind::Integer, Value::String(s)) => {
            let trimmed = s.trim();
            let number = exact_integer(trimmed)
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_number));
            match number {
                Some(n) => Value::Number(n),
                None => Value::String(s),
            }
        }
        (Kind::Integer, Value::Number(n)) if n.is_f64() => {
            match n.as_f64().and_then(whole_number) {
                Some(whole) => Value::Number(whole),
                None => Value::Number(n),
            }
        }
        (Kind::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(s),
        },
        (Kind::String, Value::Number(n)) => Value::String(n.to_string()),
        (Kind::String, Value::Bool(b)) => Value::String(b.to_string()),
        (_, value) => value,
    }
}

/// `i64` first, then `u64` for values past `i64::MAX`.
fn exact_integer(s: &str) -> Option<Number> {
    s.parse::<i64>()
        .map(Number::from)
        .or_else(|_| s.parse::<u64>().map(Number::from))
        .ok()
}

/// `4.0` → `4`. Fractions, NaN and anything outside the `i64`/`u64` range
/// yield `None`.
fn whole_number(f: f64) -> Option<Number> {
    if f.fract() != 0.0 {
        return None;
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn paths(issues: &[ValidationIssue]) -> Vec<Vec<PathItem>> {
        issues.iter().map(|i| i.path.clone()).collect()
    }

    #[test]
    fn strips_unknown_keys() {
        let s = object([("id", string()), ("name", string())]);
        let out = s.validate(json!({ "id": "1", "name": "Eloise", "createdAt": 0 })).unwrap();
        assert_eq!(out, json!({ "id": "1", "name": "Eloise" }));
    }

    #[test]
    fn strict_reports_unknown_keys() {
        let s = object([("id", string())]).strict();
        let issues = s.validate(json!({ "id": "1", "extra": true })).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "unrecognized_keys");
        assert_eq!(issues[0].message, "Unrecognized key(s) in object: 'extra'");
    }

    #[test]
    fn missing_field_is_required() {
        let s = object([("id", string()), ("name", string())]);
        let issues = s.validate(json!({ "id": "1" })).unwrap_err();
        assert_eq!(issues, vec![
            ValidationIssue::new("invalid_type", "Required").at([PathItem::from("name")])
        ]);
    }

    #[test]
    fn collects_every_issue_with_nested_paths() {
        let s = object([("items", array(object([("id", string()), ("name", string())])))]);
        let issues = s
            .validate(json!({ "items": [{ "id": "1", "name": "a" }, { "id": 2 }] }))
            .unwrap_err();
        assert_eq!(paths(&issues), vec![
            vec![PathItem::from("items"), PathItem::from(1usize), PathItem::from("id")],
            vec![PathItem::from("items"), PathItem::from(1usize), PathItem::from("name")],
        ]);
        assert_eq!(issues[0].message, "Expected string, received number");
    }

    #[test]
    fn optional_and_nullable() {
        let s = object([("nick", string().optional()), ("bio", string().nullable())]);
        assert_eq!(s.validate(json!({ "bio": null })).unwrap(), json!({ "bio": null }));
        assert!(s.validate(json!({ "nick": null, "bio": "x" })).is_err());
    }

    #[test]
    fn coerces_strings() {
        assert_eq!(integer().coerce().validate(json!("42")).unwrap(), json!(42));
        assert_eq!(number().coerce().validate(json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(boolean().coerce().validate(json!("true")).unwrap(), json!(true));
        assert_eq!(string().coerce().validate(json!(7)).unwrap(), json!("7"));
        assert!(integer().coerce().validate(json!("seven")).is_err());
        assert!(integer().validate(json!("42")).is_err());
    }

    #[test]
    fn integer_coercion_covers_u64_and_whole_floats() {
        let int = integer().coerce();
        assert_eq!(int.validate(json!("4.0")).unwrap(), json!(4));
        assert_eq!(int.validate(json!(" -12 ")).unwrap(), json!(-12));
        assert_eq!(int.validate(json!(4.0)).unwrap(), json!(4));
        assert_eq!(int.validate(json!("18446744073709551615")).unwrap(), json!(u64::MAX));
        assert!(int.validate(json!("4.5")).is_err());
        assert!(int.validate(json!(4.5)).is_err());
        assert!(int.validate(json!("18446744073709551616")).is_err());
        assert_eq!(number().coerce().validate(json!("18446744073709551615")).unwrap(), json!(u64::MAX));
    }

    #[test]
    fn integer_rejects_floats() {
        let issues = integer().validate(json!(1.5)).unwrap_err();
        assert_eq!(issues[0].message, "Expected integer, received float");
    }

    #[test]
    fn min_len() {
        let issues = string().min_len(1).validate(json!("")).unwrap_err();
        assert_eq!(issues[0].code, "too_small");
        assert!(array(any()).min_len(1).validate(json!([])).is_err());
        assert!(array(any()).min_len(1).validate(json!([null])).is_ok());
    }

    #[test]
    fn validation_is_idempotent() {
        let s = object([("id", integer().coerce()), ("name", string())]);
        let once = s.validate(json!({ "id": "3", "name": "Rex", "x": 1 })).unwrap();
        let twice = s.validate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
