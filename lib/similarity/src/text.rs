//! Ensemble text similarity
//!
//! Runs several string algorithms over the same pair and reduces their ratios
//! to one. Different algorithms break on different distortions (typos, word
//! order, partial containment), so the default mode keeps the best of them.

use crate::algorithms::{SimilarityPrimitive, TextAlgorithm};
use crate::strategy::ScoringStrategy;
use matchx_core::{ConfigError, Error, FieldValue, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How the ensemble's ratios are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMode {
    /// Minimum ratio
    Worst,
    /// Arithmetic mean
    Average,
    /// Maximum ratio
    #[default]
    Best,
}

impl ReductionMode {
    /// Reduce a non-empty ratio sequence; an empty one reduces to 0.0
    pub fn reduce(&self, ratios: &[f64]) -> f64 {
        if ratios.is_empty() {
            return 0.0;
        }
        match self {
            ReductionMode::Worst => ratios.iter().copied().fold(f64::INFINITY, f64::min),
            ReductionMode::Average => ratios.iter().sum::<f64>() / ratios.len() as f64,
            ReductionMode::Best => ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Text strategy backed by an ordered, non-empty set of primitives
#[derive(Debug)]
pub struct TextSimilarityStrategy {
    mode: ReductionMode,
    algorithms: Vec<Box<dyn SimilarityPrimitive>>,
}

impl TextSimilarityStrategy {
    /// All eight built-in algorithms under the given mode
    pub fn new(mode: ReductionMode) -> Self {
        Self {
            mode,
            algorithms: TextAlgorithm::ALL
                .iter()
                .map(|a| Box::new(*a) as Box<dyn SimilarityPrimitive>)
                .collect(),
        }
    }

    /// A chosen subset of the built-in algorithms
    pub fn with_algorithms(mode: ReductionMode, algorithms: &[TextAlgorithm]) -> Result<Self> {
        Self::with_primitives(
            mode,
            algorithms
                .iter()
                .map(|a| Box::new(*a) as Box<dyn SimilarityPrimitive>)
                .collect(),
        )
    }

    /// Any primitives, including caller-defined ones
    pub fn with_primitives(mode: ReductionMode, algorithms: Vec<Box<dyn SimilarityPrimitive>>) -> Result<Self> {
        if algorithms.is_empty() {
            return Err(ConfigError::EmptyAlgorithmSet.into());
        }
        Ok(Self { mode, algorithms })
    }

    pub fn mode(&self) -> ReductionMode {
        self.mode
    }

    pub fn algorithm_names(&self) -> Vec<&str> {
        self.algorithms.iter().map(|a| a.name()).collect()
    }

    /// Every primitive's ratio for the pair, in configured order
    pub fn ratios(&self, a: &str, b: &str) -> SmallVec<[f64; 8]> {
        self.algorithms
            .iter()
            .map(|algorithm| algorithm.similarity(a, b).clamp(0.0, 1.0))
            .collect()
    }

    /// Compare two strings; both must be non-empty
    pub fn compare(&self, a: &str, b: &str) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(Error::invalid_input(
                self.name(),
                "both values must be non-empty text",
            ));
        }
        Ok(self.mode.reduce(&self.ratios(a, b)))
    }
}

impl Default for TextSimilarityStrategy {
    fn default() -> Self {
        Self::new(ReductionMode::default())
    }
}

impl ScoringStrategy for TextSimilarityStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn score(&self, a: FieldValue<'_>, b: FieldValue<'_>) -> Result<f64> {
        match (a, b) {
            (FieldValue::Text(a), FieldValue::Text(b)) => self.compare(a, b),
            (a, b) => Err(Error::invalid_input(
                self.name(),
                format!("expected two text values, got {} and {}", a.kind(), b.kind()),
            )),
        }
    }
}
