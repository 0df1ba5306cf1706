//! Random number generator abstraction for determinism.
//!
//! Turn order is decided by a shuffle driven through this trait. In
//! production an OS-seeded [`StdRng`] is used; tests inject a scripted
//! implementation so the resulting order is known in advance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG seeded from the operating system.
#[derive(Debug)]
pub struct OsSeededRng(StdRng);

impl OsSeededRng {
    /// Creates a new generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for OsSeededRng {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicRng for OsSeededRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.0.random_range(min..=max)
    }
}

/// Uniformly permutes `items` in place (Fisher–Yates).
///
/// Each step draws `j` in `[0, i]` and swaps `items[i]` with `items[j]`,
/// walking `i` down from the last index.
#[allow(clippy::cast_possible_truncation)]
pub fn shuffle<T>(rng: &mut dyn DeterministicRng, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_u32_range(0, i as u32) as usize;
        // Out-of-range draws from a misbehaving RNG are clamped rather than
        // allowed to panic on indexing.
        items.swap(i, j.min(i));
    }
}
