//! Bounded busy-work inserted between operations to shape arrival rate
//! without system calls. Must not perform I/O or allocation — a tight loop
//! over [`std::hint::black_box`] so the optimizer cannot elide the spin.

use crate::random::Random;

/// Burn up to `max_noise` cycles of CPU-bound busy work.
///
/// When `random` is true, the bound for *this* call is redrawn from `rng`
/// (the worker's own generator — never a shared one, so there is no
/// cross-thread contention on the noise path). When false, `max_noise` is
/// used directly every call.
pub fn generate_noise(rng: &mut Random, max_noise: u64, random: bool) {
    if max_noise == 0 {
        return;
    }
    let bound = if random {
        rng.next_int(0, max_noise)
    } else {
        max_noise
    };
    let mut acc: u64 = 0;
    for _ in 0..bound {
        acc = std::hint::black_box(acc.wrapping_add(1));
    }
    std::hint::black_box(acc);
}
