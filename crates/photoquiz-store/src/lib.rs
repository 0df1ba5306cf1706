//! PostgreSQL-backed situation store for the photo quiz engine.

pub mod pg_situation_store;
pub mod schema;

pub use pg_situation_store::PgSituationStore;
