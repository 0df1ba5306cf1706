//! The unit of quiz content: an answer plus its ordered photos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database identity of a situation.
pub type SituationId = i64;

/// Database identity of a photo.
pub type PhotoId = i64;

/// Most photos a single situation may carry.
pub const MAX_PHOTOS_PER_SITUATION: usize = 5;

/// A quiz situation. Immutable once created apart from `is_used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    /// Situation identifier.
    pub id: SituationId,
    /// The text revealed at the end of the round.
    pub answer: String,
    /// Whether the situation has already been played since the last reset.
    pub is_used: bool,
    /// When the situation was authored.
    pub created_at: DateTime<Utc>,
}

/// One photo belonging to a situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// Photo identifier.
    pub id: PhotoId,
    /// Owning situation.
    pub situation_id: SituationId,
    /// Opaque reference resolved to bytes by the file-retrieval service.
    pub file_id: String,
    /// Zero-based, dense position within the situation.
    pub sort_order: i32,
    /// When the photo was attached.
    pub created_at: DateTime<Utc>,
}

/// A situation paired with its photos, ascending by `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationWithPhotos {
    /// The situation itself.
    pub situation: Situation,
    /// Photos in display order.
    pub photos: Vec<Photo>,
}

impl SituationWithPhotos {
    /// Builds the pair, sorting `photos` by `sort_order` so the ordering
    /// invariant holds regardless of how the caller fetched them.
    #[must_use]
    pub fn new(situation: Situation, mut photos: Vec<Photo>) -> Self {
        photos.sort_by_key(|p| p.sort_order);
        Self { situation, photos }
    }

    /// A situation without photos cannot be played.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !self.photos.is_empty()
    }
}

/// Pool counters reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationStats {
    /// Number of situations in the pool.
    pub total: i64,
    /// Number already played.
    pub used: i64,
    /// `total - used`.
    pub remaining: i64,
}

impl SituationStats {
    /// Derives `remaining` from the two stored counters.
    #[must_use]
    pub fn from_counts(total: i64, used: i64) -> Self {
        Self {
            total,
            used,
            remaining: total - used,
        }
    }
}
