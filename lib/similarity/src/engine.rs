//! Matching engine
//!
//! Scores every candidate of a record stream against a needle, field by field,
//! and keeps the ones whose weighted total reaches the threshold. Results keep
//! source order until [`MatchingEngine::order_results`] is called.

use crate::schema::{FieldMatchSpec, MatchConfig};
use matchx_core::{ConfigError, Error, Record, RecordRole, Result};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned by the rank-gap queries for positions without a counterpart
pub const NO_RANK_GAP: f64 = -1.0;

/// An accepted candidate
#[derive(Debug, Clone)]
pub struct MatchResult<C> {
    element: C,
    total_ratio: f64,
    trace: Vec<String>,
}

impl<C> MatchResult<C> {
    /// The candidate as yielded by the source
    pub fn element(&self) -> &C {
        &self.element
    }

    pub fn into_element(self) -> C {
        self.element
    }

    pub fn total_ratio(&self) -> f64 {
        self.total_ratio
    }

    /// One `"<ratio> - <candidate value>"` entry per field; empty unless traced
    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

/// Shared cancellation signal, checked between candidates
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Record a per-field trace on each result
    pub with_trace: bool,
    /// Drop earlier results before scanning
    pub reset_results: bool,
    pub cancel: Option<CancelFlag>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn traced(mut self) -> Self {
        self.with_trace = true;
        self
    }

    #[must_use]
    pub fn resetting(mut self) -> Self {
        self.reset_results = true;
        self
    }

    #[must_use]
    pub fn cancel_with(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub scanned: usize,
    pub accepted: usize,
}

/// Scores candidates of type `C` against a needle of type `N`
#[derive(Debug)]
pub struct MatchingEngine<N, C = N> {
    needle: N,
    configuration: Vec<FieldMatchSpec>,
    threshold: f64,
    results: Vec<MatchResult<C>>,
}

impl<N: Record, C: Record> MatchingEngine<N, C> {
    pub fn new(needle: N, configuration: Vec<FieldMatchSpec>, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(threshold).into());
        }

        Ok(Self {
            needle,
            configuration,
            threshold,
            results: Vec::new(),
        })
    }

    /// Engine over the fields and threshold of a declarative configuration
    pub fn from_config(needle: N, config: &MatchConfig) -> Result<Self> {
        Self::new(needle, config.build()?, config.threshold)
    }

    pub fn needle(&self) -> &N {
        &self.needle
    }

    pub fn configuration(&self) -> &[FieldMatchSpec] {
        &self.configuration
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn results(&self) -> &[MatchResult<C>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MatchResult<C>> {
        self.results
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// First result; the best one once results are ordered
    pub fn best(&self) -> Option<&MatchResult<C>> {
        self.results.first()
    }

    /// Scan an infallible candidate stream
    pub fn search<I>(&mut self, candidates: I, options: &SearchOptions) -> Result<ScanStats>
    where
        I: IntoIterator<Item = C>,
    {
        self.try_search(candidates.into_iter().map(Ok), options)
    }

    /// Scan a candidate stream whose items may fail to load.
    ///
    /// The first error aborts the scan. Results accepted before it are kept.
    pub fn try_search<I>(&mut self, candidates: I, options: &SearchOptions) -> Result<ScanStats>
    where
        I: IntoIterator<Item = Result<C>>,
    {
        if options.reset_results {
            self.results.clear();
        }

        let mut stats = ScanStats::default();
        if self.configuration.is_empty() {
            debug!("No fields configured, skipping scan");
            return Ok(stats);
        }

        info!(
            "Scanning candidates for '{}' over {} fields (threshold {})",
            self.needle.shape(),
            self.configuration.len(),
            self.threshold
        );

        for candidate in candidates {
            if options.is_cancelled() {
                warn!("Scan cancelled after {} candidates", stats.scanned);
                return Err(Error::Cancelled {
                    scanned: stats.scanned,
                });
            }

            let candidate = candidate?;
            let (total_ratio, trace) = self.evaluate(&candidate, stats.scanned, options.with_trace)?;
            stats.scanned += 1;

            if self.accept(candidate, total_ratio, trace) {
                stats.accepted += 1;
            }
        }

        info!("Scanned {} candidates, accepted {}", stats.scanned, stats.accepted);
        Ok(stats)
    }

    /// Stably sort results by descending total ratio
    pub fn order_results(&mut self) {
        self.results.sort_by_key(|result| Reverse(OrderedFloat(result.total_ratio)));
    }

    /// `results[0] - results[position]`, or [`NO_RANK_GAP`] when out of range
    pub fn rank_gap_to_best(&self, position: usize) -> f64 {
        match (self.results.first(), self.results.get(position)) {
            (Some(best), Some(other)) => best.total_ratio - other.total_ratio,
            _ => NO_RANK_GAP,
        }
    }

    /// `results[position] - results[position + 1]`, or [`NO_RANK_GAP`] when out of range
    pub fn rank_gap_to_next(&self, position: usize) -> f64 {
        let next = position.checked_add(1).and_then(|next| self.results.get(next));
        match (self.results.get(position), next) {
            (Some(current), Some(next)) => current.total_ratio - next.total_ratio,
            _ => NO_RANK_GAP,
        }
    }

    /// Weighted total and optional trace for one candidate
    fn evaluate(&self, candidate: &C, position: usize, with_trace: bool) -> Result<(f64, Vec<String>)> {
        if candidate.shape() != self.needle.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.needle.shape().to_string(),
                actual: candidate.shape().to_string(),
                position,
            });
        }

        let mut total_ratio = 0.0;
        let mut trace = Vec::new();

        for spec in &self.configuration {
            let needle_value = self.needle.require_field(spec.field(), RecordRole::Needle)?;
            let candidate_value = candidate.require_field(spec.field(), RecordRole::Candidate)?;

            let ratio = spec.strategy().score(needle_value, candidate_value)?;
            total_ratio += spec.contribution(ratio);

            if with_trace {
                trace.push(format!("{:?} - {}", ratio, candidate_value));
            }
        }

        Ok((total_ratio, trace))
    }

    fn accept(&mut self, element: C, total_ratio: f64, trace: Vec<String>) -> bool {
        // NaN totals never pass
        if !(total_ratio >= self.threshold) {
            return false;
        }

        debug!("Accepted candidate with total ratio {:.4}", total_ratio);
        self.results.push(MatchResult {
            element,
            total_ratio,
            trace,
        });
        true
    }
}

impl<N, C> MatchingEngine<N, C>
where
    N: Record + Sync,
    C: Record + Send + Sync,
{
    /// Scan in batches of `batch_size`, scoring each batch on the rayon pool.
    ///
    /// Accepted candidates are appended in source order and errors surface in
    /// the same order a sequential scan would hit them.
    pub fn search_parallel<I>(&mut self, candidates: I, options: &SearchOptions, batch_size: usize) -> Result<ScanStats>
    where
        I: IntoIterator<Item = Result<C>>,
    {
        if batch_size == 0 {
            return Err(ConfigError::ZeroChunkSize.into());
        }
        if options.reset_results {
            self.results.clear();
        }

        let mut stats = ScanStats::default();
        if self.configuration.is_empty() {
            debug!("No fields configured, skipping scan");
            return Ok(stats);
        }

        info!(
            "Scanning candidates for '{}' in parallel batches of {}",
            self.needle.shape(),
            batch_size
        );

        let mut candidates = candidates.into_iter();
        let mut batch = Vec::with_capacity(batch_size);
        let mut scored = Vec::with_capacity(batch_size);

        loop {
            if options.is_cancelled() {
                warn!("Scan cancelled after {} candidates", stats.scanned);
                return Err(Error::Cancelled {
                    scanned: stats.scanned,
                });
            }

            let mut source_error = None;
            for candidate in candidates.by_ref().take(batch_size) {
                match candidate {
                    Ok(candidate) => batch.push(candidate),
                    Err(e) => {
                        source_error = Some(e);
                        break;
                    }
                }
            }
            if batch.is_empty() && source_error.is_none() {
                break;
            }

            let offset = stats.scanned;
            batch
                .par_iter()
                .enumerate()
                .map(|(i, candidate)| self.evaluate(candidate, offset + i, options.with_trace))
                .collect_into_vec(&mut scored);

            for (candidate, outcome) in batch.drain(..).zip(scored.drain(..)) {
                let (total_ratio, trace) = outcome?;
                stats.scanned += 1;
                if self.accept(candidate, total_ratio, trace) {
                    stats.accepted += 1;
                }
            }

            if let Some(e) = source_error {
                return Err(e);
            }
        }

        info!("Scanned {} candidates, accepted {}", stats.scanned, stats.accepted);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{GeoProximityStrategy, Radius};
    use crate::strategy::{ScoringStrategy, SharedStrategy};
    use crate::text::{ReductionMode, TextSimilarityStrategy};
    use matchx_core::{FieldValue, GeoPoint, MapRecord};

    /// Scores a number field as the candidate's value
    #[derive(Debug)]
    struct Passthrough;

    impl ScoringStrategy for Passthrough {
        fn name(&self) -> &'static str {
            "passthrough"
        }

        fn score(&self, _a: FieldValue<'_>, b: FieldValue<'_>) -> Result<f64> {
            match b {
                FieldValue::Number(n) => Ok(n),
                other => Err(Error::invalid_input("passthrough", other.kind())),
            }
        }
    }

    fn scored(value: f64) -> MapRecord {
        MapRecord::new("item").with("score", value)
    }

    fn passthrough_engine(threshold: f64) -> MatchingEngine<MapRecord> {
        let spec = FieldMatchSpec::new(Arc::new(Passthrough), "score", 1.0).unwrap();
        MatchingEngine::new(scored(1.0), vec![spec], threshold).unwrap()
    }

    fn totals<C>(engine: &MatchingEngine<MapRecord, C>) -> Vec<f64>
    where
        C: Record,
    {
        engine.results().iter().map(MatchResult::total_ratio).collect()
    }

    fn place(name: &str, lat: f64, lon: f64) -> MapRecord {
        MapRecord::new("place")
            .with("Place", name)
            .with("Geopoint", GeoPoint::new(lat, lon))
    }

    fn place_engine() -> MatchingEngine<MapRecord> {
        let text: SharedStrategy = Arc::new(TextSimilarityStrategy::new(ReductionMode::Best));
        let geo: SharedStrategy = Arc::new(GeoProximityStrategy::new(vec![
            Radius::balanced(0.0, 0.2, 1.0, 0.8).unwrap(),
            Radius::balanced(0.2, 1.0, 0.8, 0.5).unwrap(),
            Radius::balanced(1.0, 5.0, 0.5, 0.0).unwrap(),
            Radius::flat(5.0, 10.0, 0.1).unwrap(),
        ]));
        let configuration = vec![
            FieldMatchSpec::new(text, "Place", 0.3).unwrap(),
            FieldMatchSpec::new(geo, "Geopoint", 0.7).unwrap(),
        ];
        MatchingEngine::new(place("Camp Nou", 41.380853, 2.122907), configuration, 0.0).unwrap()
    }

    #[test]
    fn test_identical_candidate_scores_one() {
        let mut engine = place_engine();
        let stats = engine
            .search(vec![place("Camp Nou", 41.380853, 2.122907)], &SearchOptions::new())
            .unwrap();

        assert_eq!(stats, ScanStats { scanned: 1, accepted: 1 });
        assert!((engine.results()[0].total_ratio() - 1.0).abs() < 1e-9);
        assert!(engine.results()[0].trace().is_empty());
    }

    #[test]
    fn test_far_candidate_scores_text_only() {
        let mut engine = place_engine();
        engine
            .search(vec![place("Camp Nou", 40.451585, -3.690375)], &SearchOptions::new().traced())
            .unwrap();

        let result = &engine.results()[0];
        assert!((result.total_ratio() - 0.3).abs() < 1e-9);
        assert_eq!(result.trace()[0], "1.0 - Camp Nou");
        assert_eq!(result.trace()[1], "0.0 - (40.451585, -3.690375)");
    }

    #[test]
    fn test_threshold_filters_and_keeps_source_order() {
        let mut engine = passthrough_engine(0.5);
        let stats = engine
            .search(vec![scored(0.4), scored(0.9), scored(0.5), scored(0.7)], &SearchOptions::new())
            .unwrap();

        assert_eq!(stats, ScanStats { scanned: 4, accepted: 3 });
        assert_eq!(totals(&engine), vec![0.9, 0.5, 0.7]);
    }

    #[test]
    fn test_results_accumulate_until_reset() {
        let mut engine = passthrough_engine(0.0);
        engine.search(vec![scored(0.2)], &SearchOptions::new()).unwrap();
        engine.search(vec![scored(0.3)], &SearchOptions::new()).unwrap();
        assert_eq!(engine.results().len(), 2);

        engine.search(vec![scored(0.4)], &SearchOptions::new().resetting()).unwrap();
        assert_eq!(totals(&engine), vec![0.4]);

        engine.clear_results();
        assert!(engine.best().is_none());
    }

    #[test]
    fn test_order_results_is_stable_and_idempotent() {
        let mut engine = passthrough_engine(0.0);
        let candidates = vec![
            MapRecord::new("item").with("score", 0.5).with("id", "a"),
            MapRecord::new("item").with("score", 0.8).with("id", "b"),
            MapRecord::new("item").with("score", 0.5).with("id", "c"),
            MapRecord::new("item").with("score", 0.9).with("id", "d"),
        ];
        engine.search(candidates, &SearchOptions::new()).unwrap();

        engine.order_results();
        let ids: Vec<_> = engine
            .results()
            .iter()
            .map(|r| r.element().field("id").and_then(|v| v.as_text()).unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);

        engine.order_results();
        assert_eq!(totals(&engine), vec![0.9, 0.8, 0.5, 0.5]);
    }

    #[test]
    fn test_rank_gaps() {
        let mut engine = passthrough_engine(0.0);
        assert_eq!(engine.rank_gap_to_best(0), NO_RANK_GAP);

        engine
            .search(vec![scored(0.5), scored(0.75), scored(1.0)], &SearchOptions::new())
            .unwrap();
        engine.order_results();

        assert_eq!(engine.rank_gap_to_best(0), 0.0);
        assert_eq!(engine.rank_gap_to_best(2), 0.5);
        assert_eq!(engine.rank_gap_to_best(3), NO_RANK_GAP);
        assert_eq!(engine.rank_gap_to_next(0), 0.25);
        assert_eq!(engine.rank_gap_to_next(1), 0.25);
        assert_eq!(engine.rank_gap_to_next(2), NO_RANK_GAP);
        assert_eq!(engine.rank_gap_to_next(usize::MAX), NO_RANK_GAP);
        assert_eq!(engine.rank_gap_to_best(usize::MAX), NO_RANK_GAP);
    }

    #[test]
    fn test_rank_gap_to_next_at_max_position_on_empty_engine() {
        let engine = passthrough_engine(0.0);
        assert_eq!(engine.rank_gap_to_next(usize::MAX), NO_RANK_GAP);
    }

    #[test]
    fn test_shape_mismatch_aborts_and_keeps_earlier_results() {
        let mut engine = passthrough_engine(0.0);
        let candidates = vec![
            scored(0.6),
            MapRecord::new("other").with("score", 0.9),
            scored(0.7),
        ];
        let err = engine.search(candidates, &SearchOptions::new()).unwrap_err();

        match err {
            Error::ShapeMismatch {
                expected,
                actual,
                position,
            } => {
                assert_eq!(expected, "item");
                assert_eq!(actual, "other");
                assert_eq!(position, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(totals(&engine), vec![0.6]);
    }

    #[test]
    fn test_missing_field_names_field_and_role() {
        let mut engine = passthrough_engine(0.0);
        let err = engine
            .search(vec![MapRecord::new("item").with("name", "x")], &SearchOptions::new())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingField { ref field, role: RecordRole::Candidate, .. } if field == "score"
        ));
    }

    #[test]
    fn test_needle_missing_field_names_needle_role() {
        let spec = FieldMatchSpec::new(Arc::new(Passthrough), "score", 1.0).unwrap();
        let mut engine: MatchingEngine<MapRecord> =
            MatchingEngine::new(MapRecord::new("item").with("name", "x"), vec![spec], 0.0).unwrap();
        let err = engine.search(vec![scored(0.5)], &SearchOptions::new()).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingField { ref field, role: RecordRole::Needle, .. } if field == "score"
        ));
        assert!(engine.results().is_empty());
    }

    #[test]
    fn test_nan_total_is_never_accepted() {
        let mut engine = passthrough_engine(0.0);
        let stats = engine
            .search(vec![scored(f64::NAN), scored(0.4)], &SearchOptions::new())
            .unwrap();

        assert_eq!(stats, ScanStats { scanned: 2, accepted: 1 });
        assert_eq!(totals(&engine), vec![0.4]);
    }

    #[test]
    fn test_invalid_input_propagates() {
        let mut engine = passthrough_engine(0.0);
        let err = engine
            .search(vec![MapRecord::new("item").with("score", "high")], &SearchOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { strategy: "passthrough", .. }));
    }

    #[test]
    fn test_cancelled_between_candidates() {
        let mut engine = passthrough_engine(0.0);
        let flag = CancelFlag::new();
        let options = SearchOptions::new().cancel_with(flag.clone());

        let trigger = flag.clone();
        let candidates = (0..10).map(move |i| {
            if i == 3 {
                trigger.cancel();
            }
            scored(0.5)
        });

        let err = engine.search(candidates, &options).unwrap_err();
        assert!(matches!(err, Error::Cancelled { scanned: 3 }));
        assert_eq!(engine.results().len(), 3);
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_source_error_aborts() {
        let mut engine = passthrough_engine(0.0);
        let candidates = vec![Ok(scored(0.4)), Err(Error::Source("boom".into())), Ok(scored(0.6))];
        let err = engine.try_search(candidates, &SearchOptions::new()).unwrap_err();

        assert!(matches!(err, Error::Source(_)));
        assert_eq!(totals(&engine), vec![0.4]);
    }

    #[test]
    fn test_empty_configuration_skips_scan() {
        let mut engine: MatchingEngine<MapRecord> = MatchingEngine::new(scored(1.0), vec![], 0.0).unwrap();
        let stats = engine.search(vec![scored(0.5)], &SearchOptions::new()).unwrap();
        assert_eq!(stats, ScanStats::default());
        assert!(engine.results().is_empty());
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let result: Result<MatchingEngine<MapRecord>> = MatchingEngine::new(scored(1.0), vec![], f64::NAN);
        assert!(matches!(result, Err(Error::Config(ConfigError::InvalidThreshold(_)))));
    }

    #[test]
    fn test_borrowed_candidates() {
        let records: Vec<MapRecord> = (0..5).map(|i| scored(i as f64 / 4.0)).collect();
        let spec = FieldMatchSpec::new(Arc::new(Passthrough), "score", 1.0).unwrap();
        let mut engine: MatchingEngine<MapRecord, &MapRecord> =
            MatchingEngine::new(scored(1.0), vec![spec], 0.5).unwrap();

        engine.search(records.iter(), &SearchOptions::new()).unwrap();
        assert_eq!(engine.results().len(), 3);
        assert!(std::ptr::eq(*engine.results()[0].element(), &records[2]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let candidates: Vec<MapRecord> = (0..57).map(|i| scored((i * 7 % 11) as f64 / 10.0)).collect();

        let mut sequential = passthrough_engine(0.3);
        let expected = sequential.search(candidates.clone(), &SearchOptions::new()).unwrap();

        let mut parallel = passthrough_engine(0.3);
        let stats = parallel
            .search_parallel(candidates.into_iter().map(Ok), &SearchOptions::new(), 8)
            .unwrap();

        assert_eq!(stats, expected);
        assert_eq!(totals(&parallel), totals(&sequential));
    }

    #[test]
    fn test_parallel_reports_first_error_in_source_order() {
        let mut engine = passthrough_engine(0.0);
        let candidates = vec![
            scored(0.1),
            scored(0.2),
            MapRecord::new("other").with("score", 0.3),
            scored(0.4),
            MapRecord::new("item").with("score", "bad"),
        ];
        let err = engine
            .search_parallel(candidates.into_iter().map(Ok), &SearchOptions::new(), 4)
            .unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { position: 2, .. }));
        assert_eq!(totals(&engine), vec![0.1, 0.2]);
    }

    #[test]
    fn test_parallel_zero_batch_rejected() {
        let mut engine = passthrough_engine(0.0);
        let err = engine
            .search_parallel(std::iter::empty(), &SearchOptions::new(), 0)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ZeroChunkSize)));
    }
}
