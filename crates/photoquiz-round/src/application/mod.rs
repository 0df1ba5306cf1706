//! Lock-guarded round operations backed by the situation store.

pub mod engine;
