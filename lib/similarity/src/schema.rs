//! Field match specifications and the declarative match configuration
//!
//! A [`FieldMatchSpec`] pairs a field name with a shared scoring strategy and a
//! weight. [`MatchConfig`] is the JSON form of an ordered list of them and
//! builds the strategies it names.

use crate::algorithms::TextAlgorithm;
use crate::distance::DistanceKind;
use crate::geo::{GeoProximityStrategy, Radius};
use crate::strategy::SharedStrategy;
use crate::text::{ReductionMode, TextSimilarityStrategy};
use matchx_core::{ConfigError, Result, DEFAULT_SHAPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Default weight bounds
pub const DEFAULT_MIN_WEIGHT: f64 = 0.0;
pub const DEFAULT_MAX_WEIGHT: f64 = 1.0;

/// One field of the matching configuration
#[derive(Clone)]
pub struct FieldMatchSpec {
    strategy: SharedStrategy,
    field: String,
    weight: f64,
    min_weight: f64,
    max_weight: f64,
}

impl FieldMatchSpec {
    /// Spec with the default `[0, 1]` weight bounds
    pub fn new(strategy: SharedStrategy, field: impl Into<String>, weight: f64) -> Result<Self> {
        Self::with_bounds(strategy, field, weight, DEFAULT_MIN_WEIGHT, DEFAULT_MAX_WEIGHT)
    }

    /// Spec whose weight must lie in `[min_weight, max_weight]`
    pub fn with_bounds(
        strategy: SharedStrategy,
        field: impl Into<String>,
        weight: f64,
        min_weight: f64,
        max_weight: f64,
    ) -> Result<Self> {
        let field = field.into();

        if !min_weight.is_finite() || !max_weight.is_finite() || min_weight >= max_weight || max_weight <= 0.0 {
            return Err(ConfigError::InvalidWeightBounds {
                field,
                min: min_weight,
                max: max_weight,
            }
            .into());
        }
        if !(min_weight..=max_weight).contains(&weight) {
            return Err(ConfigError::WeightOutOfBounds {
                field,
                weight,
                min: min_weight,
                max: max_weight,
            }
            .into());
        }

        Ok(Self {
            strategy,
            field,
            weight,
            min_weight,
            max_weight,
        })
    }

    pub fn strategy(&self) -> &SharedStrategy {
        &self.strategy
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// Weighted share of a field ratio in the total: `weight * ratio / max_weight`
    pub fn contribution(&self, ratio: f64) -> f64 {
        self.weight * ratio / self.max_weight
    }
}

impl fmt::Debug for FieldMatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMatchSpec")
            .field("field", &self.field)
            .field("strategy", &self.strategy.name())
            .field("weight", &self.weight)
            .field("min_weight", &self.min_weight)
            .field("max_weight", &self.max_weight)
            .finish()
    }
}

/// Declarative matching configuration, version 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    /// Configuration version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// Shape tag given to records loaded under this configuration
    #[serde(default = "default_shape")]
    pub shape: String,

    /// Minimum total ratio for a candidate to be kept
    #[serde(default)]
    pub threshold: f64,

    /// Field entries in scoring order
    pub fields: Vec<FieldConfig>,
}

fn default_version() -> u32 {
    1
}

fn default_shape() -> String {
    DEFAULT_SHAPE.to_string()
}

impl MatchConfig {
    pub fn new(fields: Vec<FieldConfig>) -> Self {
        Self {
            version: 1,
            shape: default_shape(),
            threshold: 0.0,
            fields,
        }
    }

    #[must_use]
    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = shape.into();
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Parse a JSON document; any structural problem is a configuration error
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()).into())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the threshold and build every field spec in order
    pub fn build(&self) -> Result<Vec<FieldMatchSpec>> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(self.threshold).into());
        }

        let specs = self
            .fields
            .iter()
            .map(FieldConfig::build)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            shape = %self.shape,
            fields = specs.len(),
            threshold = self.threshold,
            "Built match configuration"
        );
        Ok(specs)
    }
}

/// Configuration for a single field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Field name, looked up on both needle and candidate
    pub field: String,

    pub weight: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,

    pub strategy: StrategyConfig,
}

impl FieldConfig {
    /// Text field with all default algorithms
    pub fn text(field: impl Into<String>, weight: f64, mode: ReductionMode) -> Self {
        Self {
            field: field.into(),
            weight,
            min_weight: None,
            max_weight: None,
            strategy: StrategyConfig::Text {
                mode,
                algorithms: None,
            },
        }
    }

    /// Geo field with Vincenty distance and far ratio 0
    pub fn geo(field: impl Into<String>, weight: f64, bands: Vec<Radius>) -> Self {
        Self {
            field: field.into(),
            weight,
            min_weight: None,
            max_weight: None,
            strategy: StrategyConfig::Geo {
                distance: DistanceKind::default(),
                far_ratio: 0.0,
                bands,
            },
        }
    }

    pub fn build(&self) -> Result<FieldMatchSpec> {
        FieldMatchSpec::with_bounds(
            self.strategy.build()?,
            self.field.clone(),
            self.weight,
            self.min_weight.unwrap_or(DEFAULT_MIN_WEIGHT),
            self.max_weight.unwrap_or(DEFAULT_MAX_WEIGHT),
        )
    }
}

/// Strategy entry, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Ensemble of text algorithms
    Text {
        #[serde(default)]
        mode: ReductionMode,
        /// Omitted means all eight
        #[serde(default, skip_serializing_if = "Option::is_none")]
        algorithms: Option<Vec<TextAlgorithm>>,
    },
    /// Concentric distance bands
    Geo {
        #[serde(default)]
        distance: DistanceKind,
        #[serde(default)]
        far_ratio: f64,
        bands: Vec<Radius>,
    },
}

impl StrategyConfig {
    pub fn build(&self) -> Result<SharedStrategy> {
        match self {
            StrategyConfig::Text { mode, algorithms: None } => Ok(Arc::new(TextSimilarityStrategy::new(*mode))),
            StrategyConfig::Text {
                mode,
                algorithms: Some(algorithms),
            } => Ok(Arc::new(TextSimilarityStrategy::with_algorithms(*mode, algorithms)?)),
            StrategyConfig::Geo {
                distance,
                far_ratio,
                bands,
            } => {
                let strategy = GeoProximityStrategy::new(bands.clone())
                    .with_distance(distance.build())
                    .with_far_ratio(*far_ratio)?;
                Ok(Arc::new(strategy))
            }
        }
    }
}
