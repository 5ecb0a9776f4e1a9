//! The heavier end-to-end scenarios: real multi-second runs against the
//! `dashmap`-backed target, statistical goodness-of-fit checks on the live
//! dispatch stream (rather than just the precomputed table, which
//! `csb-core`'s own tests already cover exactly), and a round trip of the
//! delimited report through a real file.

use std::io::{Read, Write};

use csb_core::{Harness, Parameters, ResultBucket};
use csb_targets::{ConcurrentMapTarget, LatencyConfig, LatencyTarget, NoopTarget, OP_GET, OP_INSERT, OP_REMOVE};
use csb_tests::chi_square_p_value;

fn params(num_threads: usize, duration_secs: u64, weights: Vec<u32>) -> Parameters {
    Parameters {
        num_threads,
        duration_secs,
        initial_size: 0,
        weights,
        max_noise: 0,
        random_noise: false,
        connect_endpoint: None,
        bind_endpoint: None,
    }
}

/// Scenario B (heavier form): the *live* dispatch stream across 4 threads,
/// not just the precomputed table, matches `W=[512,512]` under a
/// conservative chi-square threshold. `csb-core`'s own test checks a
/// simple 5% ratio; this one checks the same property with statistical
/// rigor over a larger sample.
#[test]
fn scenario_b_live_distribution_passes_goodness_of_fit() {
    let mut harness = Harness::new(NoopTarget::default(), params(4, 1, vec![512, 512]));
    harness.warmup().unwrap();
    harness.run().unwrap();
    let stats = harness.stats().unwrap();

    let c0 = stats.aggregate(0, ResultBucket::SUCCESS).count;
    let c1 = stats.aggregate(1, ResultBucket::SUCCESS).count;
    assert!(c0 > 10_000 && c1 > 10_000, "too few samples for a meaningful chi-square test");

    let p = chi_square_p_value(&[c0, c1], &[0.5, 0.5]);
    assert!(p > 1e-6, "live distribution diverges from weights: p={p}, counts=({c0}, {c1})");
}

/// Scenario C: a target that blocks 2ms per dispatch. Absolute cycle
/// counts aren't portable across `x86_64` (raw TSC) and the nanosecond
/// fallback, so this calibrates cycles-per-millisecond from the run's own
/// envelope rather than assuming a clock frequency.
#[test]
fn scenario_c_blocking_target_latency_floor_is_observed() {
    let latency = LatencyConfig { per_op_latency: std::time::Duration::from_millis(2) };
    let mut harness = Harness::new(LatencyTarget::new(latency), params(4, 1, vec![1024]));
    harness.warmup().unwrap();
    harness.run().unwrap();
    let stats = harness.stats().unwrap();

    let agg = stats.aggregate(0, ResultBucket::SUCCESS);
    assert!(agg.count > 0, "no operations recorded");

    let envelope = stats.min_envelope;
    assert!(envelope.wall_ms > 0, "min envelope wall time didn't advance");
    let cycles_per_ms = envelope.elapsed_clk() as f64 / envelope.wall_ms as f64;

    let min_latency_ms = agg.min as f64 / cycles_per_ms;
    assert!(
        min_latency_ms >= 1.0,
        "minimum observed per-op latency ({min_latency_ms:.3}ms) is below the 2ms floor (with slack)"
    );
}

/// The `dashmap`-backed target under real multi-threaded contention:
/// inserts always succeed, gets/removes against a freshly-seeded map
/// legitimately miss sometimes, and every (operation, result) cell stays
/// attributable to buckets the target actually uses.
#[test]
fn concurrent_map_target_exercises_multiple_result_buckets_under_contention() {
    let mut harness = Harness::new(
        ConcurrentMapTarget::new(),
        params(8, 1, vec![400, 312, 312]), // insert, get, remove — roughly even
    );
    harness.warmup().unwrap();
    harness.run().unwrap();
    let stats = harness.stats().unwrap();

    let inserts = stats.aggregate(OP_INSERT, ResultBucket::SUCCESS);
    assert!(inserts.count > 0, "no inserts recorded");

    let gets_ok = stats.aggregate(OP_GET, ResultBucket::SUCCESS).count;
    let gets_miss = stats.aggregate(OP_GET, ResultBucket::NOT_FOUND).count;
    assert!(gets_ok + gets_miss > 0, "no gets recorded");

    let removes_ok = stats.aggregate(OP_REMOVE, ResultBucket::SUCCESS).count;
    let removes_miss = stats.aggregate(OP_REMOVE, ResultBucket::NOT_FOUND).count;
    assert!(removes_ok + removes_miss > 0, "no removes recorded");
}

/// The conclude-phase delimited report survives a round trip through a
/// real file: every line written can be read back byte-for-byte.
#[test]
fn conclude_report_round_trips_through_a_file() {
    let mut harness = Harness::new(NoopTarget::default(), params(2, 1, vec![1024]));
    harness.warmup().unwrap();
    harness.run().unwrap();
    let report = harness.conclude(';');

    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(report.as_bytes()).expect("write report");
    file.flush().expect("flush report");

    let mut read_back = String::new();
    std::fs::File::open(file.path())
        .expect("reopen temp file")
        .read_to_string(&mut read_back)
        .expect("read report back");

    assert_eq!(read_back, report);
    assert!(read_back.matches(';').count() > 4, "report should contain multiple delimited fields");
}
