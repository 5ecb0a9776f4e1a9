//! Precomputed operation-id lookup table.
//!
//! Turns a weight vector into a branch-free, cache-friendly 1024-slot array:
//! the worker loop picks the next operation by indexing `table[i % 1024]`
//! with an integer it advances monotonically, rather than branching on a
//! running weight total every iteration.

use crate::random::Random;

/// Number of slots in the distribution table.
pub const DISTRIBUTION_BOUND: usize = 1024;

/// Sentinel marking a slot that hasn't been assigned an operation id yet.
/// Never observable after [`DistributionTable::build`] returns successfully.
const UNFILLED: u32 = u32::MAX;

/// The length-1024 array mapping slot to operation id.
#[derive(Debug, Clone)]
pub struct DistributionTable {
    slots: [u32; DISTRIBUTION_BOUND],
}

impl DistributionTable {
    /// Build a table from operation weights, which must sum to exactly
    /// [`DISTRIBUTION_BOUND`] (validated by the caller before this is
    /// reached — see [`crate::params::Parameters::validate`]).
    ///
    /// Slot placement is rejection sampling: for each operation id in order,
    /// repeatedly draw a uniformly random slot until an unfilled one is
    /// found, and assign it. This is deterministic for a given `rng` stream,
    /// so the same seed plus the same weights always produces the same
    /// table (property tested in [`tests::deterministic_for_same_seed`]).
    pub fn build(weights: &[u32], rng: &mut Random) -> Self {
        debug_assert_eq!(
            weights.iter().map(|&w| w as u64).sum::<u64>(),
            DISTRIBUTION_BOUND as u64,
            "weights must sum to {DISTRIBUTION_BOUND} (validated earlier)"
        );

        let mut slots = [UNFILLED; DISTRIBUTION_BOUND];
        for (op_id, &weight) in weights.iter().enumerate() {
            let mut placed = 0u32;
            while placed < weight {
                let pos = rng.next_int(0, (DISTRIBUTION_BOUND - 1) as u64) as usize;
                if slots[pos] == UNFILLED {
                    slots[pos] = op_id as u32;
                    placed += 1;
                }
            }
        }

        debug_assert!(
            slots.iter().all(|&s| s != UNFILLED),
            "every slot must be filled after build"
        );

        Self { slots }
    }

    /// Look up the operation id occupying `slot` (taken modulo
    /// [`DISTRIBUTION_BOUND`] by the caller, matching the worker loop's
    /// `D[i % 1024]` indexing).
    #[inline(always)]
    pub fn lookup(&self, slot: usize) -> usize {
        self.slots[slot % DISTRIBUTION_BOUND] as usize
    }

    /// Starting slot for worker `thread_id` out of `num_threads`, chosen so
    /// concurrent workers traverse disjoint starting positions and decorrelate
    /// the operation stream without per-thread random state.
    pub fn start_slot(thread_id: usize, num_threads: usize) -> usize {
        (DISTRIBUTION_BOUND * thread_id) / num_threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(table: &DistributionTable, k: usize) -> Vec<u32> {
        let mut counts = vec![0u32; k];
        for slot in 0..DISTRIBUTION_BOUND {
            counts[table.lookup(slot)] += 1;
        }
        counts
    }

    #[test]
    fn every_slot_filled_with_exact_weight_counts() {
        let weights = [100u32, 200, 300, 424];
        let mut rng = Random::new();
        let table = DistributionTable::build(&weights, &mut rng);
        assert_eq!(counts(&table, weights.len()), weights.to_vec());
    }

    #[test]
    fn single_operation_fills_every_slot() {
        let weights = [1024u32];
        let mut rng = Random::new();
        let table = DistributionTable::build(&weights, &mut rng);
        for slot in 0..DISTRIBUTION_BOUND {
            assert_eq!(table.lookup(slot), 0);
        }
    }

    #[test]
    fn deterministic_for_same_seed() {
        let weights = [512u32, 512];
        let mut rng_a = Random::new();
        let mut rng_b = Random::new();
        let a = DistributionTable::build(&weights, &mut rng_a);
        let b = DistributionTable::build(&weights, &mut rng_b);
        for slot in 0..DISTRIBUTION_BOUND {
            assert_eq!(a.lookup(slot), b.lookup(slot));
        }
    }

    #[test]
    fn window_from_any_start_is_full_permutation() {
        let weights = [1023u32, 1];
        let mut rng = Random::new();
        let table = DistributionTable::build(&weights, &mut rng);
        for start in [0usize, 7, 511, 1023] {
            let mut seen = vec![0u32; weights.len()];
            for k in 0..DISTRIBUTION_BOUND {
                seen[table.lookup(start + k)] += 1;
            }
            assert_eq!(seen, weights.to_vec());
        }
    }

    #[test]
    fn rare_operation_appears_exactly_once_per_window() {
        let weights = [1023u32, 1];
        let mut rng = Random::new();
        let table = DistributionTable::build(&weights, &mut rng);
        let rare_count = (0..DISTRIBUTION_BOUND)
            .filter(|&slot| table.lookup(slot) == 1)
            .count();
        assert_eq!(rare_count, 1);
    }

    #[test]
    fn start_slot_divides_range_across_threads() {
        let num_threads = 4;
        let starts: Vec<usize> = (0..num_threads)
            .map(|t| DistributionTable::start_slot(t, num_threads))
            .collect();
        assert_eq!(starts, vec![0, 256, 512, 768]);
    }
}
