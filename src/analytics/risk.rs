//! Time-decayed risk weights and the defect probability model.
//!
//! Pure functions: a logistic decay weight for a single historical event and
//! an exponential link from accumulated weights to a bounded probability.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::types::FeatureWeights;

/// Neumaier compensated summation.
///
/// The accumulators sum many small logistic terms over a long history and
/// feed directly into exponentiation, so naive `f64` addition would let
/// rounding drift compound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Default shaping of the decay curve: the steep transition sits in the
/// last tenth of the repository's lifetime
pub const DEFAULT_TIME_RANGE: f64 = 0.0;

/// Decayed weight of one event at `ts`, normalized over the history
/// `[begin_ts, now_ts]`.
///
/// Events close to `now_ts` contribute weight approaching 1, events near
/// `begin_ts` approach 0.
pub fn decayed_weight(begin_ts: i64, ts: i64, now_ts: i64) -> f64 {
    decayed_weight_with_range(begin_ts, ts, now_ts, DEFAULT_TIME_RANGE)
}

/// Decayed weight with an explicit `time_range` shaping knob in `[0, 1]`;
/// larger values move the transition earlier in the history
pub fn decayed_weight_with_range(begin_ts: i64, ts: i64, now_ts: i64, time_range: f64) -> f64 {
    let span = now_ts - begin_ts;
    let x = if span == 0 {
        1.0
    } else {
        (ts - begin_ts) as f64 / span as f64
    };
    let exponent = -12.0 * x + 2.0 + (1.0 - time_range) * 10.0;
    1.0 / (1.0 + exponent.exp())
}

/// Probability that a component with the given accumulated weights harbors a
/// defect; monotonically increasing in each accumulator, in `[0, 1)`
pub fn defect_probability(
    revisions_twr: f64,
    fixes_twr: f64,
    authors_twr: f64,
    weights: &FeatureWeights,
) -> f64 {
    let twr = weights.revisions * revisions_twr
        + weights.fixes * fixes_twr
        + weights.authors * authors_twr;
    1.0 - (-twr).exp()
}

/// Accumulated activity metrics for one surviving component identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub revisions: u64,
    pub fixes: u64,
    pub authors: HashSet<String>,
    pub revisions_twr: StableSum,
    pub fixes_twr: StableSum,
    pub authors_twr: StableSum,
    /// Accumulator triple captured at the most recent bug-fixing event
    /// touching this component; consumed by the weight calibrator
    pub last_snapshot: Option<(f64, f64, f64)>,
    /// Derived, recomputed on demand
    pub defect_prob: f64,
}

impl Metrics {
    /// Fold one commit's contribution. `weight` is the commit's decayed
    /// weight, shared by all features.
    pub fn update(&mut self, weight: f64, author: &str, is_bug_fixing: bool) {
        self.revisions += 1;
        self.revisions_twr.add(weight);
        if is_bug_fixing {
            self.fixes += 1;
            self.fixes_twr.add(weight);
            self.last_snapshot = Some((
                self.revisions_twr.value(),
                self.fixes_twr.value(),
                self.authors_twr.value(),
            ));
        }
        if !self.authors.contains(author) {
            self.authors.insert(author.to_string());
            self.authors_twr.add(weight);
        }
    }

    pub fn defect_probability(&self, weights: &FeatureWeights) -> f64 {
        defect_probability(
            self.revisions_twr.value(),
            self.fixes_twr.value(),
            self.authors_twr.value(),
            weights,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_is_monotonic_in_event_time() {
        let begin = 1_000;
        let now = 101_000;
        let mut previous = -1.0;
        for step in 0..=100 {
            let ts = begin + step * 1_000;
            let weight = decayed_weight(begin, ts, now);
            assert!(weight >= previous, "weight decreased at step {step}");
            previous = weight;
        }
        assert!(decayed_weight(begin, begin, now) < decayed_weight(begin, now, now));
    }

    #[test]
    fn decay_endpoints_approach_zero_and_one() {
        let begin = 0;
        let now = 1_000_000;
        assert!(decayed_weight(begin, begin, now) < 1e-4);
        let recent = decayed_weight(begin, now, now);
        assert!(recent > 0.4 && recent <= 1.0);
    }

    #[test]
    fn zero_span_history_counts_as_now() {
        let weight = decayed_weight(500, 500, 500);
        assert_eq!(weight, decayed_weight(0, 1_000_000, 1_000_000));
    }

    #[test]
    fn probability_is_bounded_and_monotonic() {
        let weights = FeatureWeights::default();
        assert_eq!(defect_probability(0.0, 0.0, 0.0, &weights), 0.0);
        let mut previous = -1.0;
        for i in 0..50 {
            let twr = i as f64 * 0.5;
            let p = defect_probability(twr, twr, twr, &weights);
            assert!((0.0..1.0).contains(&p));
            assert!(p > previous);
            previous = p;
        }
    }

    #[test]
    fn stable_sum_bounds_drift_on_many_small_terms() {
        let mut stable = StableSum::default();
        stable.add(1e10);
        for _ in 0..10_000 {
            stable.add(1e-6);
        }
        stable.add(-1e10);
        let expected = 10_000.0 * 1e-6;
        assert!((stable.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn update_tracks_revisions_fixes_and_authors() {
        let mut metrics = Metrics::default();
        metrics.update(0.5, "alice@example.com", false);
        metrics.update(0.8, "alice@example.com", true);
        metrics.update(0.9, "bob@example.com", false);
        assert_eq!(metrics.revisions, 3);
        assert_eq!(metrics.fixes, 1);
        assert_eq!(metrics.authors.len(), 2);
        assert!((metrics.revisions_twr.value() - 2.2).abs() < 1e-12);
        assert!((metrics.fixes_twr.value() - 0.8).abs() < 1e-12);
        // Snapshot captured at the fix, before bob was first seen
        let (r, f, a) = metrics.last_snapshot.unwrap();
        assert!((r - 1.3).abs() < 1e-12);
        assert!((f - 0.8).abs() < 1e-12);
        assert!((a - 0.5).abs() < 1e-12);
    }
}
