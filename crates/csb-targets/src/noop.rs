//! The simplest possible target: every dispatch is free and always
//! succeeds. Useful for isolating the harness's own overhead (scenarios A,
//! B and D in the testable-properties table all drive this target).

use csb_core::{ResultBucket, Target};

/// Configuration for [`NoopTarget`].
#[derive(Debug, Clone, Copy)]
pub struct NoopConfig {
    /// Number of distinct operation ids this target reports via
    /// [`Target::op_count`]. Defaults to 1; callers driving a multi-way
    /// weight vector against a no-op target (to isolate distribution-table
    /// behavior from dispatch cost) should set this to match.
    pub op_count: usize,
}

impl Default for NoopConfig {
    fn default() -> Self {
        Self { op_count: 1 }
    }
}

/// A target whose `dispatch` does nothing and always reports
/// [`ResultBucket::SUCCESS`].
pub struct NoopTarget {
    config: NoopConfig,
}

impl NoopTarget {
    pub fn new(config: NoopConfig) -> Self {
        Self { config }
    }
}

impl Default for NoopTarget {
    fn default() -> Self {
        Self::new(NoopConfig::default())
    }
}

impl Target for NoopTarget {
    type Ctx = ();

    fn op_count(&self) -> usize {
        self.config.op_count
    }

    fn init(&self, _initial_size: usize, _num_threads: usize) {}

    fn dispatch(&self, _ctx: &mut Self::Ctx, _op_id: usize) -> ResultBucket {
        ResultBucket::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_succeeds() {
        let target = NoopTarget::default();
        let mut ctx = ();
        assert_eq!(target.dispatch(&mut ctx, 0), ResultBucket::SUCCESS);
    }

    #[test]
    fn op_count_follows_config() {
        let target = NoopTarget::new(NoopConfig { op_count: 5 });
        assert_eq!(target.op_count(), 5);
    }
}
