//! Concentric-radius geo proximity
//!
//! Distances are mapped to ratios through an ordered list of [`Radius`] bands.
//! The first band (by position) whose closed interval holds the distance wins;
//! distances outside every band get the far ratio.

use crate::distance::{DistanceFunction, Vincenty};
use crate::strategy::ScoringStrategy;
use matchx_core::{ConfigError, FieldValue, GeoPoint, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A distance band with its own ratio policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RadiusSpec", into = "RadiusSpec")]
pub struct Radius {
    from_distance: f64,
    to_distance: f64,
    max_ratio: f64,
    min_ratio: f64,
    balanced_by_distance: bool,
}

/// Wire form of a [`Radius`]; validated on the way in
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RadiusSpec {
    from: f64,
    to: f64,
    max_ratio: f64,
    min_ratio: f64,
    #[serde(default)]
    balanced_by_distance: bool,
}

impl TryFrom<RadiusSpec> for Radius {
    type Error = ConfigError;

    fn try_from(spec: RadiusSpec) -> std::result::Result<Self, Self::Error> {
        Radius::new(
            spec.from,
            spec.to,
            spec.max_ratio,
            spec.min_ratio,
            spec.balanced_by_distance,
        )
    }
}

impl From<Radius> for RadiusSpec {
    fn from(radius: Radius) -> Self {
        RadiusSpec {
            from: radius.from_distance,
            to: radius.to_distance,
            max_ratio: radius.max_ratio,
            min_ratio: radius.min_ratio,
            balanced_by_distance: radius.balanced_by_distance,
        }
    }
}

impl Radius {
    /// Band covering `[from_distance, to_distance]` km.
    ///
    /// Balanced bands fall linearly from `max_ratio` at `from_distance` to
    /// `min_ratio` at `to_distance`; flat bands return `max_ratio` throughout.
    pub fn new(
        from_distance: f64,
        to_distance: f64,
        max_ratio: f64,
        min_ratio: f64,
        balanced_by_distance: bool,
    ) -> std::result::Result<Self, ConfigError> {
        if !from_distance.is_finite() || !to_distance.is_finite() || from_distance >= to_distance {
            return Err(ConfigError::InvalidRadius {
                from: from_distance,
                to: to_distance,
            });
        }
        for (name, value) in [("max_ratio", max_ratio), ("min_ratio", min_ratio)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RatioOutOfBounds {
                    from: from_distance,
                    to: to_distance,
                    name,
                    value,
                });
            }
        }

        Ok(Self {
            from_distance,
            to_distance,
            max_ratio,
            min_ratio,
            balanced_by_distance,
        })
    }

    /// Flat band returning `ratio` anywhere inside it
    pub fn flat(from_distance: f64, to_distance: f64, ratio: f64) -> std::result::Result<Self, ConfigError> {
        Self::new(from_distance, to_distance, ratio, 0.0, false)
    }

    /// Band interpolated from `max_ratio` down to `min_ratio`
    pub fn balanced(
        from_distance: f64,
        to_distance: f64,
        max_ratio: f64,
        min_ratio: f64,
    ) -> std::result::Result<Self, ConfigError> {
        Self::new(from_distance, to_distance, max_ratio, min_ratio, true)
    }

    pub fn from_distance(&self) -> f64 {
        self.from_distance
    }

    pub fn to_distance(&self) -> f64 {
        self.to_distance
    }

    pub fn max_ratio(&self) -> f64 {
        self.max_ratio
    }

    pub fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    pub fn balanced_by_distance(&self) -> bool {
        self.balanced_by_distance
    }

    /// Closed interval test
    pub fn contains(&self, distance: f64) -> bool {
        self.from_distance <= distance && distance <= self.to_distance
    }

    /// Ratio for a distance inside the band
    pub fn ratio_at(&self, distance: f64) -> f64 {
        if !self.balanced_by_distance {
            return self.max_ratio;
        }
        if distance == self.from_distance {
            self.max_ratio
        } else if distance == self.to_distance {
            self.min_ratio
        } else {
            let slope = (self.min_ratio - self.max_ratio) / (self.to_distance - self.from_distance);
            slope * (distance - self.from_distance) + self.max_ratio
        }
    }
}

/// Geo strategy composed over a distance function
#[derive(Debug, Clone)]
pub struct GeoProximityStrategy {
    radiuses: Vec<Radius>,
    distance: Arc<dyn DistanceFunction>,
    far_ratio: f64,
}

impl GeoProximityStrategy {
    /// Bands in lookup order, Vincenty distance, far ratio 0
    pub fn new(radiuses: Vec<Radius>) -> Self {
        Self {
            radiuses,
            distance: Arc::new(Vincenty::default()),
            far_ratio: 0.0,
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance: Arc<dyn DistanceFunction>) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_far_ratio(mut self, far_ratio: f64) -> std::result::Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&far_ratio) {
            return Err(ConfigError::FarRatioOutOfBounds(far_ratio));
        }
        self.far_ratio = far_ratio;
        Ok(self)
    }

    pub fn radiuses(&self) -> &[Radius] {
        &self.radiuses
    }

    pub fn far_ratio(&self) -> f64 {
        self.far_ratio
    }

    pub fn distance_function(&self) -> &dyn DistanceFunction {
        self.distance.as_ref()
    }

    /// Ratio of the first band holding `distance`, or the far ratio
    pub fn ratio_for_distance(&self, distance: f64) -> f64 {
        self.radiuses
            .iter()
            .find(|radius| radius.contains(distance))
            .map(|radius| radius.ratio_at(distance))
            .unwrap_or(self.far_ratio)
    }

    pub fn compare_points(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        self.ratio_for_distance(self.distance.distance_km(a, b))
    }
}

impl ScoringStrategy for GeoProximityStrategy {
    fn name(&self) -> &'static str {
        "geo"
    }

    /// Missing or malformed coordinates score the far ratio instead of failing
    fn score(&self, a: FieldValue<'_>, b: FieldValue<'_>) -> Result<f64> {
        match (a.as_point(), b.as_point()) {
            (Some(a), Some(b)) if a.is_valid() && b.is_valid() => Ok(self.compare_points(a, b)),
            _ => Ok(self.far_ratio),
        }
    }
}
