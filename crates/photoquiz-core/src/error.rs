//! Store-layer error types.

use thiserror::Error;

/// Opaque failure raised by a [`SituationStore`](crate::store::SituationStore).
///
/// The round engine never inspects or retries these; they travel to the
/// caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection, query, or decoding failure in the backing database.
    #[error("database error: {0}")]
    Database(String),

    /// The store rejected the request (bad identifier, limit reached, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller's cancellation signal fired before the call completed.
    #[error("operation cancelled")]
    Cancelled,
}
