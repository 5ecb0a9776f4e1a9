//! A target that models an I/O-bound operation by blocking for a fixed
//! duration on every dispatch. Used by scenario C to verify the harness
//! correctly attributes suspension time spent inside `Target::dispatch` to
//! the operation's own latency rather than hiding it.

use std::time::Duration;

use csb_core::{ResultBucket, Target};

/// Configuration for [`LatencyTarget`].
#[derive(Debug, Clone, Copy)]
pub struct LatencyConfig {
    /// Sleep duration per dispatch. Defaults to 1ms, matching scenario C.
    pub per_op_latency: Duration,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            per_op_latency: Duration::from_millis(1),
        }
    }
}

/// A target whose `dispatch` sleeps [`LatencyConfig::per_op_latency`] before
/// returning [`ResultBucket::SUCCESS`]. Targets in memory-only workloads
/// never block; this one deliberately does, to model an I/O endpoint.
pub struct LatencyTarget {
    config: LatencyConfig,
}

impl LatencyTarget {
    pub fn new(config: LatencyConfig) -> Self {
        Self { config }
    }
}

impl Default for LatencyTarget {
    fn default() -> Self {
        Self::new(LatencyConfig::default())
    }
}

impl Target for LatencyTarget {
    type Ctx = ();

    fn op_count(&self) -> usize {
        1
    }

    fn init(&self, _initial_size: usize, _num_threads: usize) {}

    fn dispatch(&self, _ctx: &mut Self::Ctx, _op_id: usize) -> ResultBucket {
        std::thread::sleep(self.config.per_op_latency);
        ResultBucket::SUCCESS
    }
}
