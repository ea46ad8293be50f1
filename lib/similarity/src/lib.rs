//! # matchx Similarity
//!
//! Weighted, multi-field record matching.
//!
//! A [`MatchingEngine`] scores each candidate against a needle record through
//! an ordered list of [`FieldMatchSpec`]s. Each spec names a field, a weight and
//! a [`ScoringStrategy`] that turns two field values into a ratio in [0, 1].
//!
//! ## Features
//!
//! - **Text ensemble**: eight string algorithms reduced by worst, average or best
//! - **Geo bands**: distances mapped to ratios through concentric, optionally
//!   interpolated radius bands over haversine, great-circle or Vincenty distance
//! - **Declarative configuration**: the same setup as a JSON document
//! - **Ranking**: stable ordering plus rank-gap queries and explain output
//!
//! ## Example
//!
//! ```rust
//! use matchx_core::MapRecord;
//! use matchx_similarity::{
//!     FieldMatchSpec, GeoProximityStrategy, MatchingEngine, Radius, ReductionMode, SearchOptions,
//!     TextSimilarityStrategy,
//! };
//! use std::sync::Arc;
//!
//! let place = |name: &str, lat: f64, lon: f64| {
//!     MapRecord::new("place").with("Place", name).with("Geopoint", (lat, lon))
//! };
//!
//! let text = Arc::new(TextSimilarityStrategy::new(ReductionMode::Best));
//! let geo = Arc::new(GeoProximityStrategy::new(vec![
//!     Radius::balanced(0.0, 0.2, 1.0, 0.8).unwrap(),
//!     Radius::flat(0.2, 5.0, 0.3).unwrap(),
//! ]));
//! let configuration = vec![
//!     FieldMatchSpec::new(text, "Place", 0.3).unwrap(),
//!     FieldMatchSpec::new(geo, "Geopoint", 0.7).unwrap(),
//! ];
//!
//! let mut engine = MatchingEngine::new(place("Camp Nou", 41.380853, 2.122907), configuration, 0.5).unwrap();
//! engine
//!     .search(
//!         vec![
//!             place("Hotel Rallye", 41.381401, 2.126934),
//!             place("Camp Nou", 41.380853, 2.122907),
//!         ],
//!         &SearchOptions::new(),
//!     )
//!     .unwrap();
//! engine.order_results();
//!
//! assert!((engine.best().unwrap().total_ratio() - 1.0).abs() < 1e-9);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ MatchConfig │────>│  FieldSpec  │────>│  Strategy   │
//! │   (JSON)    │     │ (w, field)  │     │ text | geo  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!       ┌─────────────┐      │                   │
//!       │   Records   │─────>▼                   ▼
//!       │  (chunked)  │     ┌─────────────────────┐
//!       └─────────────┘     │   MatchingEngine    │
//!                           │ (threshold, order)  │
//!                           └─────────────────────┘
//!                                      │
//!                               ┌─────────────┐
//!                               │   Explain   │
//!                               │  (results)  │
//!                               └─────────────┘
//! ```

pub mod strategy;
pub mod algorithms;
pub mod text;
pub mod distance;
pub mod geo;
pub mod schema;
pub mod engine;
pub mod explain;

// Re-export main types for convenience
pub use strategy::{ScoringStrategy, SharedStrategy};
pub use algorithms::{SimilarityPrimitive, TextAlgorithm};
pub use text::{ReductionMode, TextSimilarityStrategy};
pub use distance::{DistanceFunction, DistanceKind, GreatCircle, Haversine, Vincenty};
pub use geo::{GeoProximityStrategy, Radius};
pub use schema::{FieldConfig, FieldMatchSpec, MatchConfig, StrategyConfig};
pub use engine::{CancelFlag, MatchResult, MatchingEngine, ScanStats, SearchOptions, NO_RANK_GAP};
pub use explain::{ExplainedMatch, MatchResponse, MatchStats};
