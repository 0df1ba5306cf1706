//! Photo Quiz Core — shared domain types and abstractions.
//!
//! This crate defines the situation model, the store contract the round
//! engine consumes, and the clock/RNG seams used for determinism. It
//! contains no infrastructure code.

pub mod cancel;
pub mod clock;
pub mod error;
pub mod rng;
pub mod situation;
pub mod store;
