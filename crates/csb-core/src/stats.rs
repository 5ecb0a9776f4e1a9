//! Per-thread, per-operation, per-result latency accumulator.
//!
//! During the run phase cell `(t, *, *)` is written exclusively by worker
//! `t`: each worker owns its own [`ThreadStats`] outright in its closure and
//! hands it back to the driver through the `JoinHandle` return value on
//! join. That ownership transfer *is* the "single writer, reader only after
//! the stop barrier" invariant — the borrow checker enforces it instead of
//! relying on programmer discipline, unlike the lock-free-by-convention
//! original.

use serde::Serialize;

use crate::target::ResultBucket;
use crate::time::CycleUnit;

/// One (operation, result) cell: count, latency sum, min, max, all in raw
/// cycle-counter units (or nanoseconds on the fallback clock, see
/// [`crate::time`]).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Cell {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Cell {
    const fn empty() -> Self {
        Cell {
            count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
        }
    }
}

/// Accumulator owned by a single worker thread for the duration of the run
/// phase: a dense `op_count x ResultBucket::COUNT` grid of [`Cell`]s.
#[derive(Debug, Clone)]
pub struct ThreadStats {
    op_count: usize,
    cells: Vec<Cell>,
}

impl ThreadStats {
    /// Allocate a zeroed accumulator for `op_count` operation ids.
    pub fn new(op_count: usize) -> Self {
        Self {
            op_count,
            cells: vec![Cell::empty(); op_count * ResultBucket::COUNT],
        }
    }

    fn index(&self, op: usize, result: ResultBucket) -> usize {
        op * ResultBucket::COUNT + result.index()
    }

    /// Record one operation's outcome and latency.
    ///
    /// If `skip` is true this is a no-op, preserved as a contract for a
    /// future preemption detector (comparing the CPU id before/after an
    /// operation) to exclude contaminated samples without widening this API.
    pub fn add_op(&mut self, op: usize, result: ResultBucket, cycles: u64, skip: bool) {
        if skip {
            return;
        }
        let idx = self.index(op, result);
        let cell = &mut self.cells[idx];
        cell.count += 1;
        cell.sum += cycles;
        cell.min = cell.min.min(cycles);
        cell.max = cell.max.max(cycles);
    }

    pub fn cell(&self, op: usize, result: ResultBucket) -> &Cell {
        &self.cells[self.index(op, result)]
    }

    pub fn op_count(&self) -> usize {
        self.op_count
    }
}

/// Bracketing timing window: bounds the interval during which every worker
/// was (for `min`) or could have been (for `max`) running.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Envelope {
    pub start_clk: u64,
    pub stop_clk: u64,
    pub wall_ms: u64,
}

impl Envelope {
    pub fn elapsed_clk(&self) -> u64 {
        self.stop_clk.saturating_sub(self.start_clk)
    }
}

/// The full accumulator: one [`ThreadStats`] per worker plus the two
/// envelopes, created in warmup and destroyed (dropped) in cooldown.
#[derive(Debug)]
pub struct Stats {
    per_thread: Vec<ThreadStats>,
    pub min_envelope: Envelope,
    pub max_envelope: Envelope,
    pub cycle_unit: CycleUnit,
}

impl Stats {
    /// Allocate the `T x K x R` accumulator.
    pub fn init(num_threads: usize, op_count: usize, cycle_unit: CycleUnit) -> Self {
        Self {
            per_thread: (0..num_threads).map(|_| ThreadStats::new(op_count)).collect(),
            min_envelope: Envelope::default(),
            max_envelope: Envelope::default(),
            cycle_unit,
        }
    }

    /// Replace the per-thread accumulators with the ones returned by the
    /// joined worker threads, in thread-id order.
    pub fn install_thread_stats(&mut self, per_thread: Vec<ThreadStats>) {
        self.per_thread = per_thread;
    }

    pub fn thread(&self, t: usize) -> &ThreadStats {
        &self.per_thread[t]
    }

    pub fn num_threads(&self) -> usize {
        self.per_thread.len()
    }

    /// Record the envelopes produced by the run phase; called exactly once,
    /// after join.
    pub fn add_spent_time(&mut self, min_envelope: Envelope, max_envelope: Envelope) {
        self.min_envelope = min_envelope;
        self.max_envelope = max_envelope;
    }

    /// Total operation count across every thread, operation id and result
    /// bucket.
    pub fn total_ops(&self) -> u64 {
        self.per_thread
            .iter()
            .flat_map(|ts| ts.cells.iter())
            .map(|c| c.count)
            .sum()
    }

    /// Per-(operation, result) aggregate across all threads: count, sum,
    /// min, max — the body of the delimited print in §6.4.
    pub fn aggregate(&self, op: usize, result: ResultBucket) -> Cell {
        let mut agg = Cell::empty();
        for ts in &self.per_thread {
            let c = ts.cell(op, result);
            if c.count == 0 {
                continue;
            }
            agg.count += c.count;
            agg.sum += c.sum;
            agg.min = agg.min.min(c.min);
            agg.max = agg.max.max(c.max);
        }
        if agg.count == 0 {
            agg.min = 0;
        }
        agg
    }

    /// Render the parameter-independent statistics body: one delimited
    /// record per (operation, result) bucket, followed by the two
    /// envelopes. Matches §6.4: stable, position-defined, unlabeled order.
    pub fn format(&self, op_count: usize, delimiter: char) -> String {
        let mut out = String::new();
        for op in 0..op_count {
            for r in 0..ResultBucket::COUNT {
                let cell = self.aggregate(op, ResultBucket::new(r as u8));
                out.push_str(&format!(
                    "{}{d}{}{d}{}{d}{}{d}",
                    cell.count,
                    cell.sum,
                    cell.min,
                    cell.max,
                    d = delimiter
                ));
            }
        }
        out.push_str(&format!(
            "{}{d}{}{d}{}{d}",
            self.min_envelope.start_clk,
            self.min_envelope.stop_clk,
            self.min_envelope.wall_ms,
            d = delimiter
        ));
        out.push_str(&format!(
            "{}{d}{}{d}{}",
            self.max_envelope.start_clk,
            self.max_envelope.stop_clk,
            self.max_envelope.wall_ms,
            d = delimiter
        ));
        out
    }

    /// One aggregated cell per (operation, result) pair, in the same
    /// stable order [`Stats::format`] uses — the structured counterpart of
    /// the delimited report, for callers that want a `serde` value instead
    /// of position-defined text fields.
    pub fn cell_reports(&self, op_count: usize) -> Vec<CellReport> {
        let mut cells = Vec::with_capacity(op_count * ResultBucket::COUNT);
        for op in 0..op_count {
            for r in 0..ResultBucket::COUNT {
                let cell = self.aggregate(op, ResultBucket::new(r as u8));
                if cell.count == 0 {
                    continue;
                }
                cells.push(CellReport { op, result: r as u8, cell });
            }
        }
        cells
    }
}

/// One non-empty (operation, result) cell, labeled with its coordinates —
/// the JSON report omits empty cells rather than padding out the full
/// `op_count x ResultBucket::COUNT` grid the delimited text format writes
/// unconditionally.
#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub op: usize,
    pub result: u8,
    #[serde(flatten)]
    pub cell: Cell,
}
