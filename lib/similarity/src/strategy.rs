//! The scoring strategy capability
//!
//! Every field comparison goes through [`ScoringStrategy::score`], which maps a
//! pair of field values to a ratio in [0.0, 1.0] where 1.0 means identical.
//! The engine only sees this trait, so new strategies plug in without touching it.

use matchx_core::{FieldValue, Result};
use std::fmt;
use std::sync::Arc;

pub trait ScoringStrategy: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and error messages
    fn name(&self) -> &'static str;

    /// Compare two field values.
    ///
    /// Returns a ratio in [0.0, 1.0], or [`matchx_core::Error::InvalidInput`]
    /// when the values fall outside what the strategy accepts.
    fn score(&self, a: FieldValue<'_>, b: FieldValue<'_>) -> Result<f64>;
}

/// Strategy handle shared between field specs and scan threads
pub type SharedStrategy = Arc<dyn ScoringStrategy>;

