//! A target whose only purpose is to drive more than one result bucket
//! deterministically, independent of any real contention — used to verify
//! the accumulator attributes each bucket correctly under scenario F.

use std::sync::atomic::{AtomicUsize, Ordering};

use csb_core::{ResultBucket, Target};

/// Per-worker call counter; each worker alternates independently, so the
/// overall mix stays balanced regardless of how many workers are racing.
#[derive(Default)]
pub struct AlternatingCtx {
    calls: AtomicUsize,
}

/// A target that reports [`ResultBucket::SUCCESS`] on even calls and
/// [`ResultBucket::RETRY`] on odd calls, per worker.
#[derive(Default)]
pub struct AlternatingTarget;

impl Target for AlternatingTarget {
    type Ctx = AlternatingCtx;

    fn op_count(&self) -> usize {
        1
    }

    fn init(&self, _initial_size: usize, _num_threads: usize) {}

    fn dispatch(&self, ctx: &mut Self::Ctx, _op_id: usize) -> ResultBucket {
        let n = ctx.calls.fetch_add(1, Ordering::Relaxed);
        if n % 2 == 0 {
            ResultBucket::SUCCESS
        } else {
            ResultBucket::RETRY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_starting_with_success() {
        let target = AlternatingTarget;
        let mut ctx = AlternatingCtx::default();
        assert_eq!(target.dispatch(&mut ctx, 0), ResultBucket::SUCCESS);
        assert_eq!(target.dispatch(&mut ctx, 0), ResultBucket::RETRY);
        assert_eq!(target.dispatch(&mut ctx, 0), ResultBucket::SUCCESS);
        assert_eq!(target.dispatch(&mut ctx, 0), ResultBucket::RETRY);
    }
}
