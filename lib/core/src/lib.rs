//! # matchx Core
//!
//! Core library for the matchx record-matching engine.
//!
//! This crate provides the pieces every scoring strategy and the engine share:
//!
//! - [`FieldValue`] - Borrowed view of a field (text, number, geo point, ...)
//! - [`Record`] - Shape tag plus field access, implemented for JSON and map records
//! - [`BatchSource`] / [`ChunkedRecords`] - Lazy, batched candidate streams
//! - [`Error`] / [`ConfigError`] - The error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use matchx_core::{ChunkedRecords, JsonRecord, Record, SliceSource};
//! use serde_json::json;
//!
//! let records = vec![
//!     JsonRecord::new("place", json!({"Place": "Camp Nou", "Geopoint": [41.380853, 2.122907]})),
//!     JsonRecord::new("place", json!({"Place": "Plaza Mayor", "Geopoint": [40.415832, -3.707285]})),
//! ];
//!
//! for record in ChunkedRecords::new(SliceSource::new(&records), 1).unwrap() {
//!     let record = record.unwrap();
//!     assert_eq!(record.shape(), "place");
//! }
//! ```

pub mod error;
pub mod value;
pub mod record;
pub mod source;

pub use error::{ConfigError, Error, RecordRole, Result};
pub use value::{FieldValue, GeoPoint, OwnedValue};
pub use record::{JsonRecord, MapRecord, Record, DEFAULT_SHAPE};
pub use source::{BatchSource, ChunkedRecords, JsonLinesSource, SliceSource, DEFAULT_CHUNK_SIZE};
