//! Record model
//!
//! A record is anything that can name its shape and hand out field values by
//! identifier. The engine compares shapes between the needle and every candidate
//! and reads fields through [`Record::field`], so both associative records
//! ([`JsonRecord`], [`MapRecord`]) and plain structs implementing the trait work.

use crate::error::{Error, RecordRole, Result};
use crate::value::{FieldValue, OwnedValue};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Shape tag used when the caller does not declare one
pub const DEFAULT_SHAPE: &str = "record";

pub trait Record {
    /// Caller-declared shape tag. Needle and candidates must agree on it.
    fn shape(&self) -> &str;

    /// Value of the named field, or `None` when the record has no such field
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Like [`Record::field`] but reports a missing field as an error
    fn require_field(&self, name: &str, role: RecordRole) -> Result<FieldValue<'_>> {
        self.field(name).ok_or_else(|| Error::MissingField {
            field: name.to_string(),
            role,
            shape: self.shape().to_string(),
        })
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn shape(&self) -> &str {
        (**self).shape()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        (**self).field(name)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn shape(&self) -> &str {
        (**self).shape()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        (**self).field(name)
    }
}

impl<T: Record + ?Sized> Record for Arc<T> {
    fn shape(&self) -> &str {
        (**self).shape()
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        (**self).field(name)
    }
}

/// A JSON object with a declared shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    shape: String,
    value: Value,
}

impl JsonRecord {
    #[must_use]
    pub fn new(shape: impl Into<String>, value: Value) -> Self {
        Self {
            shape: shape.into(),
            value,
        }
    }

    /// Record with the default shape tag
    #[must_use]
    pub fn untyped(value: Value) -> Self {
        Self::new(DEFAULT_SHAPE, value)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Record for JsonRecord {
    fn shape(&self) -> &str {
        &self.shape
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.value.as_object()?.get(name).map(FieldValue::from_json)
    }
}

/// A hash-map backed record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    shape: String,
    fields: AHashMap<String, OwnedValue>,
}

impl MapRecord {
    #[must_use]
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            fields: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OwnedValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OwnedValue>) -> Option<OwnedValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record for MapRecord {
    fn shape(&self) -> &str {
        &self.shape
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.fields.get(name).map(OwnedValue::as_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::GeoPoint;
    use serde_json::json;

    struct Venue {
        name: String,
        location: Option<GeoPoint>,
    }

    impl Record for Venue {
        fn shape(&self) -> &str {
            "venue"
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "name" => Some(FieldValue::Text(&self.name)),
                "location" => Some(self.location.map(FieldValue::Point).unwrap_or(FieldValue::Null)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_json_record_field_access() {
        let record = JsonRecord::new("place", json!({"Place": "Camp Nou", "Geopoint": [41.38, 2.12]}));

        assert_eq!(record.shape(), "place");
        assert_eq!(record.field("Place"), Some(FieldValue::Text("Camp Nou")));
        assert_eq!(record.field("Geopoint").and_then(|v| v.as_point()), Some(GeoPoint::new(41.38, 2.12)));
        assert_eq!(record.field("Missing"), None);
    }

    #[test]
    fn test_json_record_non_object_has_no_fields() {
        let record = JsonRecord::untyped(json!("just a string"));
        assert_eq!(record.field("anything"), None);
        assert_eq!(record.shape(), DEFAULT_SHAPE);
    }

    #[test]
    fn test_map_record_field_access() {
        let record = MapRecord::new("place")
            .with("Place", "Camp Nou")
            .with("Geopoint", (41.38, 2.12));

        assert_eq!(record.len(), 2);
        assert_eq!(record.field("Place").and_then(|v| v.as_text()), Some("Camp Nou"));
        assert!(record.field("Geopoint").and_then(|v| v.as_point()).is_some());
    }

    #[test]
    fn test_attribute_style_record() {
        let venue = Venue {
            name: "Camp Nou".to_string(),
            location: None,
        };

        assert_eq!(venue.field("name"), Some(FieldValue::Text("Camp Nou")));
        assert_eq!(venue.field("location"), Some(FieldValue::Null));
    }

    #[test]
    fn test_require_field_reports_role_and_shape() {
        let record = MapRecord::new("place").with("Place", "Camp Nou");
        let err = record.require_field("Geopoint", RecordRole::Needle).unwrap_err();

        match err {
            Error::MissingField { field, role, shape } => {
                assert_eq!(field, "Geopoint");
                assert_eq!(role, RecordRole::Needle);
                assert_eq!(shape, "place");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reference_and_box_records() {
        let record = MapRecord::new("place").with("Place", "Camp Nou");
        let by_ref: &MapRecord = &record;
        let boxed: Box<dyn Record> = Box::new(record.clone());

        assert_eq!(by_ref.shape(), "place");
        assert_eq!(boxed.field("Place"), Some(FieldValue::Text("Camp Nou")));
    }
}
