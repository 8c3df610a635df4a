//! Seeded randomness for simulations
//!
//! Every random decision a simulation makes is drawn from ChaCha20 streams
//! forked from one root seed, so the seed fully determines a run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::cell::RefCell;

/// Environment variable holding a seed to replay
pub const DST_SEED_ENV: &str = "DST_SEED";

/// ChaCha20 stream keyed by a `u64` seed
///
/// Single-threaded: draws go through a `RefCell` so callers can share it
/// by reference.
#[derive(Debug)]
pub struct DeterministicRng {
    seed: u64,
    stream: RefCell<ChaCha20Rng>,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: RefCell::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    /// Seed this stream was created with; log it to replay a failure
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&self) -> u64 {
        self.stream.borrow_mut().gen()
    }

    /// Uniform in `[0, 1)`
    pub fn next_f64(&self) -> f64 {
        self.stream.borrow_mut().gen()
    }

    /// `true` with the given probability
    ///
    /// 0.0 never fires and 1.0 always fires.
    pub fn next_bool(&self, probability: f64) -> bool {
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability {} outside [0, 1]",
            probability
        );
        self.next_f64() < probability
    }

    /// Uniform in `[low, high)`
    pub fn next_range(&self, low: u64, high: u64) -> u64 {
        assert!(low < high, "empty range {}..{}", low, high);
        self.stream.borrow_mut().gen_range(low..high)
    }

    /// Uniform index into a collection of `len` items
    pub fn next_index(&self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty collection");
        self.stream.borrow_mut().gen_range(0..len)
    }

    /// Uniformly pick one item, or `None` when `items` is empty
    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_index(items.len()))
    }

    /// Derive an independent stream
    ///
    /// The child seed depends only on this stream's state, so forks replay
    /// along with their parent.
    pub fn fork(&self) -> Self {
        Self::new(self.next_u64())
    }
}

/// Read `DST_SEED` or draw a fresh seed, logging it either way
pub fn seed_from_env_or_random() -> u64 {
    let from_env = std::env::var(DST_SEED_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok());

    let seed = from_env.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        replayed = from_env.is_some(),
        "Simulation seed (replay with {}={})",
        DST_SEED_ENV,
        seed
    );
    seed
}
