//! Explainable match output
//!
//! Serializable views of an engine's results: rank, score, gaps to the best
//! and next result, and the per-field trace when one was recorded.

use crate::engine::{MatchResult, MatchingEngine, ScanStats, NO_RANK_GAP};
use matchx_core::Record;
use serde::Serialize;
use serde_json::Value;

/// One result with its ranking context
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedMatch {
    /// Zero-based position in the engine's results
    pub rank: usize,
    /// Weighted total ratio
    pub score: f64,
    pub gap_to_best: f64,
    /// `None` for the last result
    pub gap_to_next: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ExplainedMatch {
    /// Explain the first `limit` results in their current order.
    ///
    /// Call [`MatchingEngine::order_results`] first for gaps to be meaningful.
    pub fn from_engine<N, C, F>(engine: &MatchingEngine<N, C>, limit: Option<usize>, payload: F) -> Vec<Self>
    where
        N: Record,
        C: Record,
        F: Fn(&C) -> Option<Value>,
    {
        let limit = limit.unwrap_or(usize::MAX);
        engine
            .results()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(rank, result)| {
                let gap_to_next = engine.rank_gap_to_next(rank);
                Self {
                    rank,
                    score: result.total_ratio(),
                    gap_to_best: engine.rank_gap_to_best(rank),
                    gap_to_next: (gap_to_next != NO_RANK_GAP).then_some(gap_to_next),
                    trace: result.trace().to_vec(),
                    payload: payload(result.element()),
                }
            })
            .collect()
    }
}

/// Response printed for a match query
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub result: Vec<ExplainedMatch>,
    pub stats: MatchStats,
}

impl MatchResponse {
    pub fn new(result: Vec<ExplainedMatch>, stats: MatchStats) -> Self {
        Self { result, stats }
    }

    pub fn from_engine<N, C, F>(
        engine: &MatchingEngine<N, C>,
        scan: ScanStats,
        limit: Option<usize>,
        payload: F,
    ) -> Self
    where
        N: Record,
        C: Record,
        F: Fn(&C) -> Option<Value>,
    {
        Self {
            result: ExplainedMatch::from_engine(engine, limit, payload),
            stats: MatchStats::compute(engine.results(), scan.scanned),
        }
    }
}

/// Summary statistics for a match query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    /// Number of candidates scanned
    pub candidates_count: usize,
    /// Number of accepted candidates
    pub results_count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
}

impl MatchStats {
    pub fn compute<C>(results: &[MatchResult<C>], candidates_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                worst_score: 0.0,
            };
        }

        let scores = results.iter().map(MatchResult::total_ratio);
        let avg_score = scores.clone().sum::<f64>() / results.len() as f64;
        let best_score = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let worst_score = scores.fold(f64::INFINITY, f64::min);

        Self {
            candidates_count,
            results_count: results.len(),
            avg_score,
            best_score,
            worst_score,
        }
    }
}
