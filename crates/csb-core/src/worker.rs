//! The per-worker loop: register, rendezvous, dispatch-time-record in a
//! tight loop until stopped, rendezvous again, deregister.

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::distribution::DistributionTable;
use crate::noise::generate_noise;
use crate::random::Random;
use crate::stats::ThreadStats;
use crate::target::Target;
use crate::time::read_cycle_counter;

/// Configuration a worker needs that does not change once the run phase
/// starts, grouped so `worker_loop`'s signature stays readable.
pub struct WorkerConfig<'a> {
    pub thread_id: usize,
    pub num_threads: usize,
    pub op_count: usize,
    pub max_noise: u64,
    pub random_noise: bool,
    pub table: &'a DistributionTable,
    pub stop: &'a AtomicBool,
    pub start_barrier: &'a Barrier,
    pub stop_barrier: &'a Barrier,
}

/// Run one worker's full lifecycle against `target` and return the
/// [`ThreadStats`] it accumulated. Ownership of the returned stats is the
/// sole guarantee that cell `(t, *, *)` was written by exactly one thread:
/// nothing else holds a reference to it until this function returns.
pub fn worker_loop<T: Target>(target: &T, cfg: WorkerConfig<'_>) -> ThreadStats {
    let mut ctx = T::Ctx::default();
    let mut i = DistributionTable::start_slot(cfg.thread_id, cfg.num_threads);
    let mut rng = Random::new();
    // Seed with the thread id (never 0, which seeds the warmup-phase
    // distribution-table build) so each worker's noise stream is
    // independent without any shared, contended generator.
    rng.seed((cfg.thread_id as u64) ^ 0xC5B_C5B_C5B);
    let mut stats = ThreadStats::new(cfg.op_count);

    target.register(&mut ctx, cfg.thread_id);
    cfg.start_barrier.wait();

    while !cfg.stop.load(Ordering::Relaxed) {
        let op = cfg.table.lookup(i);

        let start = read_cycle_counter();
        let result = target.dispatch(&mut ctx, op);
        let end = read_cycle_counter();

        // `skip` is always false today; retained as a contract for a future
        // preemption detector (see `csb_core::stats`).
        stats.add_op(op, result, end.wrapping_sub(start), false);

        generate_noise(&mut rng, cfg.max_noise, cfg.random_noise);
        i += 1;
    }

    cfg.stop_barrier.wait();
    target.deregister(&mut ctx, cfg.thread_id);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ResultBucket;

    struct CountingTarget;
    impl Target for CountingTarget {
        type Ctx = ();
        fn op_count(&self) -> usize {
            1
        }
        fn init(&self, _initial_size: usize, _num_threads: usize) {}
        fn dispatch(&self, _ctx: &mut Self::Ctx, _op_id: usize) -> ResultBucket {
            ResultBucket::SUCCESS
        }
    }

    #[test]
    fn single_worker_records_operations_until_stopped() {
        let target = CountingTarget;
        let weights = [1024u32];
        let mut rng = Random::new();
        let table = DistributionTable::build(&weights, &mut rng);
        let stop = AtomicBool::new(false);
        let start_barrier = Barrier::new(2);
        let stop_barrier = Barrier::new(2);

        let stop_ref: &AtomicBool = &stop;
        let start_ref = &start_barrier;
        let stop_barrier_ref = &stop_barrier;
        let table_ref = &table;

        let handle = std::thread::scope(|scope| {
            let h = scope.spawn(|| {
                worker_loop(
                    &target,
                    WorkerConfig {
                        thread_id: 0,
                        num_threads: 1,
                        op_count: 1,
                        max_noise: 0,
                        random_noise: false,
                        table: table_ref,
                        stop: stop_ref,
                        start_barrier: start_ref,
                        stop_barrier: stop_barrier_ref,
                    },
                )
            });
            start_barrier.wait();
            std::thread::sleep(std::time::Duration::from_millis(20));
            stop.store(true, Ordering::Relaxed);
            stop_barrier.wait();
            h.join().unwrap()
        });

        let cell = handle.cell(0, ResultBucket::SUCCESS);
        assert!(cell.count > 0);
    }
}
