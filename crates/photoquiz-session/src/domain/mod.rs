//! Session domain: scores, players, and the session aggregate.

pub mod player;
pub mod score;
pub mod session;
