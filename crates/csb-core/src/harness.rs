//! Phase driver: warmup → run → conclude → cooldown.
//!
//! `Harness<T>` is generic over the target type rather than holding a
//! `Box<dyn Target>`, so the worker loop's `dispatch` call is statically
//! monomorphized — no vtable indirection on the hot path, keeping call
//! overhead negligible next to the cycle-counter read bracketing it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::distribution::DistributionTable;
use crate::error::{BmError, ResourceError};
use crate::params::Parameters;
use crate::random::Random;
use crate::stats::{CellReport, Envelope, Stats, ThreadStats};
use crate::target::Target;
use crate::time::{read_cycle_counter, wall_clock_ms, CYCLE_UNIT};
use crate::worker::{worker_loop, WorkerConfig};

/// The structured counterpart of [`Harness::conclude`]'s delimited text
/// report: the same parameter dump, per-cell aggregates and envelopes,
/// serializable with `serde` for callers that want JSON (or any other
/// `serde`-backed format) instead of parsing positional fields.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub num_threads: usize,
    pub duration_secs: u64,
    pub initial_size: usize,
    pub max_noise: u64,
    pub cycle_unit: &'static str,
    pub cells: Vec<CellReport>,
    pub min_envelope: Envelope,
    pub max_envelope: Envelope,
}

/// Sleep before the start barrier to let workers reach pre-barrier code
/// before the envelope clock starts. Heuristic — a readiness-count-based
/// wait was considered and rejected; see `DESIGN.md`.
const PRE_BARRIER_SLEEP: Duration = Duration::from_millis(1);

/// The benchmark engine bound to one target and one set of parameters.
///
/// Owns the mutable run state (`RunContext` of the design notes) explicitly
/// rather than through process-wide globals: the distribution table, the
/// stats accumulator and the stop flag all live here, reachable from workers
/// only through the `Arc`s built in [`Harness::run`].
pub struct Harness<T: Target> {
    target: Arc<T>,
    params: Parameters,
    table: Option<Arc<DistributionTable>>,
    stats: Option<Stats>,
}

impl<T: Target + 'static> Harness<T> {
    pub fn new(target: T, params: Parameters) -> Self {
        Self {
            target: Arc::new(target),
            params,
            table: None,
            stats: None,
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Seed the deterministic RNG, initialize the target and the stats
    /// accumulator, validate the weight vector, build the distribution
    /// table, and resolve the optional network endpoints.
    pub fn warmup(&mut self) -> Result<(), BmError> {
        info!("warmup: validating parameters");
        self.params.validate()?;
        self.params.resolve_endpoints()?;

        let op_count = self.params.op_count();
        self.stats = Some(Stats::init(self.params.num_threads, op_count, CYCLE_UNIT));

        debug!(
            "warmup: target.init(initial_size={}, num_threads={})",
            self.params.initial_size, self.params.num_threads
        );
        self.target.init(self.params.initial_size, self.params.num_threads);

        // Seeded with 0 so the table is reproducible across runs with
        // identical weights, per §4.2.
        let mut rng = Random::new();
        self.table = Some(Arc::new(DistributionTable::build(&self.params.weights, &mut rng)));

        info!("warmup: complete ({} threads, {} ops)", self.params.num_threads, op_count);
        Ok(())
    }

    /// Spawn `T` workers, time the measurement window, signal stop, join,
    /// and record the two envelopes. Requires [`Harness::warmup`] to have
    /// run first.
    pub fn run(&mut self) -> Result<(), BmError> {
        let table = Arc::clone(
            self.table
                .as_ref()
                .expect("Harness::run called before Harness::warmup"),
        );
        let num_threads = self.params.num_threads;
        let op_count = self.params.op_count();
        let max_noise = self.params.max_noise;
        let random_noise = self.params.random_noise;

        let stop = Arc::new(AtomicBool::new(false));
        let start_barrier = Arc::new(Barrier::new(num_threads + 1));
        let stop_barrier = Arc::new(Barrier::new(num_threads + 1));

        info!("run: spawning {num_threads} worker threads for {}s", self.params.duration_secs);

        let mut handles = Vec::with_capacity(num_threads);
        let mut spawn_err = None;
        for thread_id in 0..num_threads {
            let target = Arc::clone(&self.target);
            let table = Arc::clone(&table);
            let stop = Arc::clone(&stop);
            let start_barrier = Arc::clone(&start_barrier);
            let stop_barrier = Arc::clone(&stop_barrier);

            let spawned = thread::Builder::new()
                .name(format!("csb-worker-{thread_id}"))
                .spawn(move || {
                    worker_loop(
                        target.as_ref(),
                        WorkerConfig {
                            thread_id,
                            num_threads,
                            op_count,
                            max_noise,
                            random_noise,
                            table: table.as_ref(),
                            stop: stop.as_ref(),
                            start_barrier: start_barrier.as_ref(),
                            stop_barrier: stop_barrier.as_ref(),
                        },
                    )
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    spawn_err = Some(ResourceError::ThreadSpawn { thread_id, source });
                    break;
                }
            }
        }

        if let Some(err) = spawn_err {
            // The process must not enter the run phase partially
            // initialized. Threads already spawned are left parked on
            // `start_barrier`, which now can never reach its configured
            // `num_threads + 1` arrivals — an accepted leak restricted to
            // the already-rare case of OS thread-spawn exhaustion, where
            // the process is in no condition to make further progress
            // anyway.
            return Err(BmError::Resource(err));
        }

        thread::sleep(PRE_BARRIER_SLEEP);
        let max_start = Envelope {
            start_clk: read_cycle_counter(),
            stop_clk: 0,
            wall_ms: wall_clock_ms(),
        };

        start_barrier.wait();
        let mut min_envelope = Envelope {
            start_clk: read_cycle_counter(),
            stop_clk: 0,
            wall_ms: wall_clock_ms(),
        };

        thread::sleep(Duration::from_secs(self.params.duration_secs));
        stop.store(true, Ordering::Relaxed);

        min_envelope.stop_clk = read_cycle_counter();
        let min_stop_wall = wall_clock_ms();

        stop_barrier.wait();
        let max_stop_clk = read_cycle_counter();
        let max_stop_wall = wall_clock_ms();

        let mut per_thread: Vec<ThreadStats> = Vec::with_capacity(num_threads);
        for handle in handles {
            per_thread.push(handle.join().expect("worker thread panicked"));
        }

        let max_envelope = Envelope {
            start_clk: max_start.start_clk,
            stop_clk: max_stop_clk,
            wall_ms: max_stop_wall.saturating_sub(max_start.wall_ms),
        };
        let min_envelope_final = Envelope {
            start_clk: min_envelope.start_clk,
            stop_clk: min_envelope.stop_clk,
            wall_ms: min_stop_wall.saturating_sub(min_envelope.wall_ms),
        };

        let stats = self.stats.as_mut().expect("stats allocated in warmup");
        stats.install_thread_stats(per_thread);
        stats.add_spent_time(min_envelope_final, max_envelope);

        info!(
            "run: complete, {} total operations recorded",
            stats.total_ops()
        );
        Ok(())
    }

    /// Tear the target down and render the delimited report described in
    /// §6.4: parameter dump, then per-(operation, result) aggregates, then
    /// the two envelopes.
    pub fn conclude(&self, delimiter: char) -> String {
        info!("conclude: destroying target");
        self.target.destroy(self.params.num_threads);

        let stats = self.stats.as_ref().expect("Harness::conclude called before run");
        let mut out = String::new();
        out.push_str(&format!(
            "{}{d}{}{d}{}{d}{}{d}{}{d}",
            self.params.num_threads,
            self.params.duration_secs,
            self.params.initial_size,
            self.params.max_noise,
            CYCLE_UNIT.label(),
            d = delimiter
        ));
        out.push_str(&stats.format(self.params.op_count(), delimiter));
        out
    }

    /// The structured counterpart of [`Harness::conclude`]. Does not tear
    /// the target down a second time — call at most one of `conclude` or
    /// `conclude_report` per run, matching the single-shot phase lifecycle.
    pub fn conclude_report(&self) -> Report {
        info!("conclude: destroying target");
        self.target.destroy(self.params.num_threads);

        let stats = self.stats.as_ref().expect("Harness::conclude_report called before run");
        Report {
            num_threads: self.params.num_threads,
            duration_secs: self.params.duration_secs,
            initial_size: self.params.initial_size,
            max_noise: self.params.max_noise,
            cycle_unit: CYCLE_UNIT.label(),
            cells: stats.cell_reports(self.params.op_count()),
            min_envelope: stats.min_envelope,
            max_envelope: stats.max_envelope,
        }
    }

    /// Release the statistics accumulator. Consumes `self`.
    pub fn cooldown(self) {
        info!("cooldown: releasing statistics");
        drop(self);
    }

    /// Run all four phases in order and return the rendered report, matching
    /// the C original's `main`.
    pub fn execute(mut self, delimiter: char) -> Result<String, BmError> {
        self.warmup()?;
        self.run()?;
        let report = self.conclude(delimiter);
        self.cooldown();
        Ok(report)
    }

    /// Direct access to the built distribution table, for callers (tests,
    /// alternate drivers) that want to inspect it without running the full
    /// lifecycle.
    pub fn table(&self) -> Option<&DistributionTable> {
        self.table.as_deref()
    }

    /// Direct access to the accumulated statistics after `run` completes.
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }
}
