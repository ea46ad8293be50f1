//! Field values as seen by scoring strategies
//!
//! Records hand out borrowed [`FieldValue`]s so candidate data is never copied
//! while scoring. [`OwnedValue`] is the storage form used by map-backed records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A geographic coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    #[serde(alias = "lng")]
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and inside the usual ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        GeoPoint::new(lat, lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Borrowed view of a single record field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(&'a str),
    Point(GeoPoint),
    /// A value no built-in strategy understands, tagged with its kind
    Other(&'static str),
}

impl<'a> FieldValue<'a> {
    /// Read a JSON value as a field value.
    ///
    /// Two-number arrays and objects carrying `lat` and `lon` (or `lng`)
    /// numbers are read as points.
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Other("number")),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => match items.as_slice() {
                [lat, lon] => match (lat.as_f64(), lon.as_f64()) {
                    (Some(lat), Some(lon)) => FieldValue::Point(GeoPoint::new(lat, lon)),
                    _ => FieldValue::Other("array"),
                },
                _ => FieldValue::Other("array"),
            },
            Value::Object(map) => {
                let lat = map.get("lat").and_then(Value::as_f64);
                let lon = map
                    .get("lon")
                    .or_else(|| map.get("lng"))
                    .and_then(Value::as_f64);
                match (lat, lon) {
                    (Some(lat), Some(lon)) => FieldValue::Point(GeoPoint::new(lat, lon)),
                    _ => FieldValue::Other("object"),
                }
            }
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<GeoPoint> {
        match self {
            FieldValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::Point(_) => "point",
            FieldValue::Other(kind) => *kind,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Point(p) => write!(f, "{}", p),
            FieldValue::Other(kind) => write!(f, "<{}>", kind),
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(s: &'a str) -> Self {
        FieldValue::Text(s)
    }
}

impl From<GeoPoint> for FieldValue<'_> {
    fn from(p: GeoPoint) -> Self {
        FieldValue::Point(p)
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// Owned field storage for map-backed records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnedValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Point(GeoPoint),
}

impl OwnedValue {
    pub fn as_field(&self) -> FieldValue<'_> {
        match self {
            OwnedValue::Null => FieldValue::Null,
            OwnedValue::Bool(b) => FieldValue::Bool(*b),
            OwnedValue::Number(n) => FieldValue::Number(*n),
            OwnedValue::Text(s) => FieldValue::Text(s),
            OwnedValue::Point(p) => FieldValue::Point(*p),
        }
    }
}

impl From<&str> for OwnedValue {
    fn from(s: &str) -> Self {
        OwnedValue::Text(s.to_string())
    }
}

impl From<String> for OwnedValue {
    fn from(s: String) -> Self {
        OwnedValue::Text(s)
    }
}

impl From<f64> for OwnedValue {
    fn from(n: f64) -> Self {
        OwnedValue::Number(n)
    }
}

impl From<bool> for OwnedValue {
    fn from(b: bool) -> Self {
        OwnedValue::Bool(b)
    }
}

impl From<GeoPoint> for OwnedValue {
    fn from(p: GeoPoint) -> Self {
        OwnedValue::Point(p)
    }
}

impl From<(f64, f64)> for OwnedValue {
    fn from(pair: (f64, f64)) -> Self {
        OwnedValue::Point(pair.into())
    }
}

impl<T: Into<OwnedValue>> From<Option<T>> for OwnedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(OwnedValue::Null)
    }
}
