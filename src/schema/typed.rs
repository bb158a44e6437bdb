use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;

use super::Schema;
use crate::error::{PathItem, ValidationIssue};

/// A schema defined by a serde type.
///
/// A value is valid when it deserializes into `T`; the validated output is
/// `T` serialized back, so unknown fields are dropped and defaults filled in
/// exactly as `T`'s serde attributes say.
///
/// ```rust
/// use schemaroute::schema::{Schema, Typed};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Deserialize, Serialize)]
/// struct NewPet { name: String }
///
/// let schema = Typed::<NewPet>::new();
/// assert_eq!(schema.validate(json!({ "name": "Eloise", "x": 1 })).unwrap(), json!({ "name": "Eloise" }));
/// assert!(schema.validate(json!({})).is_err());
/// ```
pub struct Typed<T>(PhantomData<fn() -> T>);

impl<T> Typed<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn validate(&self, value: Value) -> Result<Value, Vec<ValidationIssue>> {
        let typed: T = serde_path_to_error::deserialize(value).map_err(|e| {
            let path = e.path().iter().filter_map(path_item).collect::<Vec<_>>();
            vec![ValidationIssue::new("invalid_type", e.into_inner().to_string()).at(path)]
        })?;
        serde_json::to_value(typed).map_err(|e| vec![ValidationIssue::new("custom", e.to_string())])
    }
}

fn path_item(segment: &Segment) -> Option<PathItem> {
    match segment {
        Segment::Seq { index } => Some(PathItem::Index(*index)),
        Segment::Map { key } => Some(PathItem::Key(key.clone())),
        Segment::Enum { variant } => Some(PathItem::Key(variant.clone())),
        Segment::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize, Serialize)]
    struct Pet {
        id: u32,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn round_trips_through_the_type() {
        let out = Typed::<Pet>::new().validate(json!({ "id": 1, "owner": "ana" })).unwrap();
        assert_eq!(out, json!({ "id": 1, "tags": [] }));
    }

    #[test]
    fn reports_serde_message() {
        let issues = Typed::<Pet>::new().validate(json!({ "id": "one" })).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "invalid_type");
        assert!(issues[0].message.contains("invalid type"), "{}", issues[0].message);
        assert_eq!(issues[0].path, vec![PathItem::from("id")]);
    }

    #[test]
    fn locates_nested_failures() {
        let issues = Typed::<Pet>::new()
            .validate(json!({ "id": 1, "tags": ["a", 2] }))
            .unwrap_err();
        assert_eq!(issues[0].path, vec![PathItem::from("tags"), PathItem::from(1usize)]);

        let issues = Typed::<Pet>::new().validate(json!({ "tags": [] })).unwrap_err();
        assert!(issues[0].message.contains("missing field `id`"), "{}", issues[0].message);
        assert!(issues[0].path.is_empty());
    }
}
