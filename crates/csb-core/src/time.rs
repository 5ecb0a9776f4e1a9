//! Dual-clock timing envelope: a cycle counter for the per-operation hot path
//! and a wall-clock millisecond timestamp for the run-phase envelope.
//!
//! The cycle counter must be callable from any worker without synchronization
//! or a system call. The core only ever subtracts two readings taken on the
//! same thread, so wrap-around is irrelevant as long as the difference fits
//! in 64 bits.

use std::time::{SystemTime, UNIX_EPOCH};

/// Which unit [`read_cycle_counter`] returns, for the printed parameter dump.
///
/// On `x86_64` this is a true unfenced TSC reading (cycles). Everywhere else
/// it falls back to a monotonic nanosecond clock, per the documented
/// substitution for architectures without a user-space cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleUnit {
    Cycles,
    Nanoseconds,
}

impl CycleUnit {
    pub const fn label(self) -> &'static str {
        match self {
            CycleUnit::Cycles => "cycles",
            CycleUnit::Nanoseconds => "ns",
        }
    }
}

/// The unit [`read_cycle_counter`] reports on this build's target architecture.
pub const CYCLE_UNIT: CycleUnit = if cfg!(target_arch = "x86_64") {
    CycleUnit::Cycles
} else {
    CycleUnit::Nanoseconds
};

/// Read the hardware time-stamp counter (or its fallback), unfenced.
///
/// Two readings taken on the same thread around a single operation yield a
/// meaningful difference; no ordering guarantee is made across threads.
#[inline(always)]
pub fn read_cycle_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: `_rdtsc` is available on every x86_64 target; it has no
        // memory-safety precondition, only the (accepted) lack of fencing.
        unsafe { core::arch::x86_64::_rdtsc() }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        // No user-space cycle counter on this architecture: substitute a
        // monotonic nanosecond clock, per the documented fallback.
        use std::time::Instant;
        use std::sync::OnceLock;
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_nanos() as u64
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Used only for the run-phase envelope (`min`/`max` start/stop), never on
/// the per-operation hot path.
pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_counter_is_monotonic_non_decreasing_on_one_thread() {
        let a = read_cycle_counter();
        let b = read_cycle_counter();
        assert!(b >= a);
    }

    #[test]
    fn wall_clock_increases() {
        let a = wall_clock_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = wall_clock_ms();
        assert!(b >= a);
    }
}
