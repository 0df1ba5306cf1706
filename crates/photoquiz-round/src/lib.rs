//! Photo Quiz — round engine.
//!
//! Owns the single "currently playing" situation and its photo cursor:
//! draws a new round from the store, advances one photo at a time,
//! reveals the answer, and retires finished situations.

pub mod application;
pub mod domain;

pub use application::engine::RoundEngine;
pub use domain::errors::RoundError;
pub use domain::round_state::{PhotoProgress, RoundSnapshot, RoundState};
