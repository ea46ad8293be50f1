//! # matchx
//!
//! A configurable record-matching engine.
//!
//! Given a reference record (the needle) and a population of candidates,
//! matchx computes a weighted similarity for every candidate across one or
//! more fields, keeps the ones reaching a threshold, and ranks them.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! matchx --config match.json --needle needle.json --candidates places.jsonl --trace --top 5
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use matchx::prelude::*;
//! use serde_json::json;
//!
//! let config = MatchConfig::from_json_str(r#"{
//!     "shape": "place",
//!     "fields": [
//!         {"field": "Place", "weight": 1.0, "strategy": {"type": "text", "mode": "average"}}
//!     ]
//! }"#).unwrap();
//!
//! let needle = JsonRecord::new("place", json!({"Place": "Camp Nou"}));
//! let candidates = vec![
//!     JsonRecord::new("place", json!({"Place": "Plaza Mayor"})),
//!     JsonRecord::new("place", json!({"Place": "Camp Nou"})),
//! ];
//!
//! let mut engine = MatchingEngine::from_config(needle, &config).unwrap();
//! engine.search(candidates, &SearchOptions::new()).unwrap();
//! engine.order_results();
//!
//! assert_eq!(engine.rank_gap_to_best(0), 0.0);
//! assert_eq!(engine.best().unwrap().element().value()["Place"], "Camp Nou");
//! ```
//!
//! ## Crate Structure
//!
//! matchx is composed of two crates:
//!
//! - [`matchx-core`](https://docs.rs/matchx-core) - Errors, field values, records and record sources
//! - [`matchx-similarity`](https://docs.rs/matchx-similarity) - Strategies, configuration, engine and explain output

// Re-export core types
pub use matchx_core::{
    ChunkedRecords, ConfigError, Error, FieldValue, GeoPoint, JsonLinesSource, JsonRecord, MapRecord,
    OwnedValue, Record, Result, SliceSource, BatchSource, DEFAULT_CHUNK_SIZE,
};

// Re-export similarity
pub use matchx_similarity::{
    CancelFlag, DistanceFunction, DistanceKind, ExplainedMatch, FieldMatchSpec, GeoProximityStrategy,
    MatchConfig, MatchResponse, MatchResult, MatchStats, MatchingEngine, Radius, ReductionMode,
    ScanStats, ScoringStrategy, SearchOptions, TextAlgorithm, TextSimilarityStrategy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ChunkedRecords, JsonLinesSource, JsonRecord, MapRecord, Record, SliceSource,
        FieldMatchSpec, MatchConfig, MatchingEngine, SearchOptions,
        GeoProximityStrategy, Radius, ReductionMode, ScoringStrategy, TextSimilarityStrategy,
        Error, Result,
    };
}

/// Text similarity primitives
pub mod algorithms {
    pub use matchx_similarity::algorithms::{
        hamming_distance, normalize_edit_count, partial_ratio, simple_ratio, string_score,
        token_set_ratio, token_sort_ratio,
    };
}
