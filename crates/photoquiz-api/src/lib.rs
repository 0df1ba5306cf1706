//! Photo quiz API server library.
//!
//! Exposes the router, state and startup plumbing so the binary and the
//! integration tests build the application the same way.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod turn_watcher;
