//! A `dashmap`-backed concurrent map target: a realistic pluggable target
//! whose three operation ids exercise more than one result bucket under
//! real contention (insert always succeeds; get and remove can legitimately
//! miss).

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

use csb_core::{ResultBucket, Target};

/// Operation id 0: insert a fresh key.
pub const OP_INSERT: usize = 0;
/// Operation id 1: look up a previously-inserted key.
pub const OP_GET: usize = 1;
/// Operation id 2: remove a previously-inserted key.
pub const OP_REMOVE: usize = 2;

/// Per-worker scratch: a lazily-seeded RNG (seeded from the thread id on
/// `register`, so it can't be [`Default`]-constructed before the thread id
/// is known) used to pick keys to read or remove.
#[derive(Default)]
pub struct MapCtx {
    rng: Option<StdRng>,
    /// Monotonic per-thread counter folded into inserted keys so concurrent
    /// workers never collide on the same key.
    local_counter: u64,
}

impl MapCtx {
    fn rng(&mut self) -> &mut StdRng {
        self.rng.get_or_insert_with(|| StdRng::seed_from_u64(0))
    }
}

/// A concurrent map target backed by [`DashMap<u64, u64>`].
pub struct ConcurrentMapTarget {
    map: DashMap<u64, u64>,
    high_water_key: AtomicU64,
}

impl ConcurrentMapTarget {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            high_water_key: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ConcurrentMapTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for ConcurrentMapTarget {
    type Ctx = MapCtx;

    fn op_count(&self) -> usize {
        3
    }

    fn init(&self, initial_size: usize, _num_threads: usize) {
        for i in 0..initial_size as u64 {
            self.map.insert(i, i);
            self.high_water_key.fetch_max(i + 1, Ordering::Relaxed);
        }
    }

    fn register(&self, ctx: &mut Self::Ctx, thread_id: usize) {
        ctx.rng = Some(StdRng::seed_from_u64(thread_id as u64));
    }

    fn dispatch(&self, ctx: &mut Self::Ctx, op_id: usize) -> ResultBucket {
        match op_id {
            OP_INSERT => {
                let key = self.high_water_key.fetch_add(1, Ordering::Relaxed);
                ctx.local_counter += 1;
                self.map.insert(key, key);
                ResultBucket::SUCCESS
            }
            OP_GET => {
                let upper = self.high_water_key.load(Ordering::Relaxed).max(1);
                let key = ctx.rng().random_range(0..upper);
                if self.map.contains_key(&key) {
                    ResultBucket::SUCCESS
                } else {
                    ResultBucket::NOT_FOUND
                }
            }
            OP_REMOVE => {
                let upper = self.high_water_key.load(Ordering::Relaxed).max(1);
                let key = ctx.rng().random_range(0..upper);
                if self.map.remove(&key).is_some() {
                    ResultBucket::SUCCESS
                } else {
                    ResultBucket::NOT_FOUND
                }
            }
            _ => ResultBucket::REJECTED,
        }
    }

    fn destroy(&self, _num_threads: usize) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_succeeds() {
        let target = ConcurrentMapTarget::new();
        target.init(0, 1);
        let mut ctx = MapCtx::default();
        target.register(&mut ctx, 0);
        assert_eq!(target.dispatch(&mut ctx, OP_INSERT), ResultBucket::SUCCESS);
        // get always draws from [0, high_water_key), which now includes the
        // key we just inserted (key 0); with only one key present, get
        // must find it.
        assert_eq!(target.dispatch(&mut ctx, OP_GET), ResultBucket::SUCCESS);
    }

    #[test]
    fn get_on_empty_map_is_not_found() {
        let target = ConcurrentMapTarget::new();
        target.init(0, 1);
        let mut ctx = MapCtx::default();
        target.register(&mut ctx, 0);
        assert_eq!(target.dispatch(&mut ctx, OP_GET), ResultBucket::NOT_FOUND);
    }

    #[test]
    fn destroy_clears_the_map() {
        let target = ConcurrentMapTarget::new();
        target.init(4, 1);
        assert_eq!(target.len(), 4);
        target.destroy(1);
        assert!(target.is_empty());
    }
}
