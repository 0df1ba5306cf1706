//! Pure round state and its error vocabulary.

pub mod errors;
pub mod round_state;
