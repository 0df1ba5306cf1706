//! Lock-guarded session operations and the turn-end channel.

pub mod manager;
pub mod turn_events;
