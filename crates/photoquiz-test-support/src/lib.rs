//! Shared test fakes and utilities for the photo quiz engine.

mod clock;
mod rng;
mod store;

pub use clock::FixedClock;
pub use rng::{MockRng, SequenceRng};
pub use store::{FailingSituationStore, InMemorySituationStore};
