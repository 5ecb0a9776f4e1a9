//! Statistical helpers for the workspace's heavier property tests.
//!
//! Kept as a library (rather than folded directly into `tests/`) because
//! `statrs`-based goodness-of-fit checks are shared across more than one
//! scenario in this crate's test suite.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Chi-square goodness-of-fit p-value for `observed` bucket counts against
/// `expected_probs` (which must sum to ~1.0 and have the same length as
/// `observed`).
///
/// A low p-value means the observed counts are unlikely to have come from
/// the expected distribution; callers reject at a conservative threshold
/// (e.g. `1e-6`) rather than the conventional `0.05`, since a true-positive
/// benchmark run is still a single sample and common alpha levels would
/// produce flaky test failures.
///
/// # Panics
/// Panics if `observed` and `expected_probs` differ in length, or if
/// `observed` has fewer than two buckets (chi-square needs at least one
/// degree of freedom).
pub fn chi_square_p_value(observed: &[u64], expected_probs: &[f64]) -> f64 {
    assert_eq!(observed.len(), expected_probs.len(), "bucket count mismatch");
    assert!(observed.len() >= 2, "need at least two buckets for a degree of freedom");

    let total: f64 = observed.iter().sum::<u64>() as f64;
    let degrees_of_freedom = (observed.len() - 1) as f64;

    let statistic: f64 = observed
        .iter()
        .zip(expected_probs)
        .map(|(&o, &p)| {
            let expected = total * p;
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let chi = ChiSquared::new(degrees_of_freedom).expect("degrees of freedom must be positive");
    1.0 - chi.cdf(statistic)
}
