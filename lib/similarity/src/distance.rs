//! Geodesic distance functions
//!
//! Every function takes two coordinate pairs in decimal degrees and returns the
//! distance between them in kilometers. The geo strategy is composed over a
//! [`DistanceFunction`], so formulas and band policies vary independently.

use matchx_core::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Mean Earth radius used by the haversine formula (km)
pub const HAVERSINE_RADIUS_KM: f64 = 6371.0088;
/// Earth radius used by the great-circle formula (km)
pub const GREAT_CIRCLE_RADIUS_KM: f64 = 6371.009;
/// WGS-84 semi-major axis (km)
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

pub trait DistanceFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Distance in kilometers, never negative
    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64;
}

/// Haversine formula on a sphere
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceFunction for Haversine {
    fn name(&self) -> &'static str {
        "haversine"
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (b.lon - a.lon).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * HAVERSINE_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
    }
}

/// Great-circle distance via the `atan2` form of the spherical law
#[derive(Debug, Clone, Copy, Default)]
pub struct GreatCircle;

impl DistanceFunction for GreatCircle {
    fn name(&self) -> &'static str {
        "great_circle"
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        let (sin_lat1, cos_lat1) = a.lat.to_radians().sin_cos();
        let (sin_lat2, cos_lat2) = b.lat.to_radians().sin_cos();
        let (sin_dlon, cos_dlon) = (b.lon - a.lon).to_radians().sin_cos();

        let y = ((cos_lat2 * sin_dlon).powi(2)
            + (cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon).powi(2))
        .sqrt();
        let x = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;
        GREAT_CIRCLE_RADIUS_KM * y.atan2(x)
    }
}

/// Vincenty's inverse formula on the WGS-84 ellipsoid.
///
/// Near-antipodal points may not converge; those fall back to [`GreatCircle`].
#[derive(Debug, Clone, Copy)]
pub struct Vincenty {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for Vincenty {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
        }
    }
}

impl Vincenty {
    /// Ellipsoidal distance, or `None` when the iteration does not converge
    pub fn try_distance_km(&self, a: GeoPoint, b: GeoPoint) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }

        let f = WGS84_F;
        let semi_major = WGS84_A_KM;
        let semi_minor = (1.0 - f) * semi_major;

        let l = (b.lon - a.lon).to_radians();
        let u1 = ((1.0 - f) * a.lat.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * b.lat.to_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut converged = false;
        let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 0.0, 0.0);
        let (mut cos_sq_alpha, mut cos_2sigma_m) = (0.0, 0.0);

        for _ in 0..self.max_iterations {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                // Coincident points
                return Some(0.0);
            }
            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            sigma = sin_sigma.atan2(cos_sigma);

            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial line: cos_sq_alpha is 0
            cos_2sigma_m = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };

            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let previous = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

            if (lambda - previous).abs() < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return None;
        }

        let u_sq = cos_sq_alpha * (semi_major.powi(2) - semi_minor.powi(2)) / semi_minor.powi(2);
        let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma.powi(2))
                            * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

        Some(semi_minor * big_a * (sigma - delta_sigma))
    }
}

impl DistanceFunction for Vincenty {
    fn name(&self) -> &'static str {
        "vincenty"
    }

    fn distance_km(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        match self.try_distance_km(a, b) {
            Some(km) => km,
            None => {
                warn!(%a, %b, "Vincenty formula did not converge, using great-circle distance");
                GreatCircle.distance_km(a, b)
            }
        }
    }
}

/// Selector for the built-in distance functions, used by declarative configs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    Haversine,
    GreatCircle,
    #[default]
    Vincenty,
}

impl DistanceKind {
    pub fn build(&self) -> Arc<dyn DistanceFunction> {
        match self {
            DistanceKind::Haversine => Arc::new(Haversine),
            DistanceKind::GreatCircle => Arc::new(GreatCircle),
            DistanceKind::Vincenty => Arc::new(Vincenty::default()),
        }
    }
}
