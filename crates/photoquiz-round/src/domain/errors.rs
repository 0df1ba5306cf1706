//! Round engine error types.

use photoquiz_core::error::StoreError;
use thiserror::Error;

/// The closed set of failures a round operation can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// No round is active.
    #[error("no round is in progress")]
    NotStarted,

    /// The photo cursor is already on the last photo.
    #[error("no more photos in this round")]
    NoMorePhotos,

    /// The store has no unused, playable situation left.
    #[error("no situations available")]
    NoSituationsAvailable,

    /// Propagated unchanged from the situation store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
