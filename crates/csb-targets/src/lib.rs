//! Built-in [`csb_core::Target`] implementations.
//!
//! Each target here models a different shape of workload: free (`noop`),
//! latency-bound (`latency`), realistically contended (`concurrent_map`), and
//! multi-outcome (`alternating`). None of this is required to plug in a new
//! target — implement `csb_core::Target` directly for that — these are just
//! the ones the CLI ships with.

mod alternating;
mod concurrent_map;
mod latency;
mod noop;

pub use alternating::{AlternatingCtx, AlternatingTarget};
pub use concurrent_map::{ConcurrentMapTarget, MapCtx, OP_GET, OP_INSERT, OP_REMOVE};
pub use latency::{LatencyConfig, LatencyTarget};
pub use noop::{NoopConfig, NoopTarget};
