//! # csb-core
//!
//! The engine behind a concurrent micro-benchmark harness for pluggable
//! targets — typically concurrent data structures, allocators, or I/O
//! endpoints.
//!
//! A single run measures per-operation latency and aggregate throughput
//! while `T` worker threads issue operations drawn from a fixed categorical
//! distribution against a shared [`Target`] for a bounded duration.
//!
//! ## Architecture
//!
//! Parameters → distribution table → barrier-synchronized workers → stats
//!
//! [`Harness::execute`] drives the full phased lifecycle: warmup (seed the
//! RNG, initialize the target, build the distribution table), run (spawn
//! workers, time the window, signal stop, join), conclude (tear the target
//! down, render the delimited report), cooldown (drop the accumulator).
//!
//! The target itself is out of scope for this crate — see the [`Target`]
//! trait. `csb-targets` bundles a few reference implementations so this
//! engine is runnable without a third-party target crate.

pub mod distribution;
pub mod error;
pub mod harness;
pub mod noise;
pub mod params;
pub mod random;
pub mod stats;
pub mod target;
pub mod time;
pub mod worker;

pub use distribution::{DistributionTable, DISTRIBUTION_BOUND};
pub use error::{BmError, ConfigError, ResourceError};
pub use harness::{Harness, Report};
pub use params::{NetEndpoint, Parameters, DEFAULT_ENDPOINT_PORT};
pub use random::Random;
pub use stats::{Cell, CellReport, Envelope, Stats, ThreadStats};
pub use target::{ResultBucket, Target};
pub use time::{read_cycle_counter, wall_clock_ms, CycleUnit, CYCLE_UNIT};

/// Library version (from `Cargo.toml`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
