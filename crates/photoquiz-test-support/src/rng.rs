//! Test RNG — deterministic `DeterministicRng` implementations for tests.

use photoquiz_core::rng::DeterministicRng;

/// An RNG that always returns `max`. Under the Fisher–Yates shuffle this
/// keeps the input order, so turn order equals the order names were given.
#[derive(Debug, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, _min: u32, max: u32) -> u32 {
        max
    }
}

/// An RNG that returns values from a predetermined sequence. Panics if the
/// sequence is exhausted. Used in tests that need a specific turn order.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }
}
