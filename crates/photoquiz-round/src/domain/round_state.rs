//! The in-memory round: which situation is being played and at which photo.
//!
//! The cursor only exists alongside a situation, so "index without a
//! situation" cannot be represented. A situation with zero photos is
//! refused at [`RoundState::start`], which keeps `index < photos.len()`
//! true for as long as the round lives.

use photoquiz_core::situation::{Photo, SituationId, SituationWithPhotos};
use serde::Serialize;

use super::errors::RoundError;

/// Position of the photo cursor, 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoProgress {
    /// 1-based index of the photo currently shown.
    pub current: usize,
    /// Number of photos in the round.
    pub total: usize,
}

impl PhotoProgress {
    /// Whether another photo can still be revealed.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.current < self.total
    }
}

#[derive(Debug, Clone)]
struct ActiveRound {
    situation: SituationWithPhotos,
    index: usize,
}

/// Round state. `Default` is the idle state.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    active: Option<ActiveRound>,
}

/// A consistent view of the active round, taken in one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// The situation being played.
    pub situation_id: SituationId,
    /// The photo currently shown.
    pub photo: Photo,
    /// Where the cursor stands.
    pub progress: PhotoProgress,
}

impl RoundState {
    /// Starts a round on `situation` at its first photo.
    ///
    /// # Errors
    ///
    /// Hands the situation back unchanged when it has no photos.
    pub fn start(situation: SituationWithPhotos) -> Result<Self, SituationWithPhotos> {
        if !situation.is_playable() {
            return Err(situation);
        }
        Ok(Self {
            active: Some(ActiveRound {
                situation,
                index: 0,
            }),
        })
    }

    /// Whether a round is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Identity of the situation being played, if any.
    #[must_use]
    pub fn situation_id(&self) -> Option<SituationId> {
        self.active.as_ref().map(|r| r.situation.situation.id)
    }

    fn active(&self) -> Result<&ActiveRound, RoundError> {
        self.active.as_ref().ok_or(RoundError::NotStarted)
    }

    /// The photo under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle.
    pub fn current_photo(&self) -> Result<&Photo, RoundError> {
        let round = self.active()?;
        Ok(&round.situation.photos[round.index])
    }

    /// Moves the cursor forward by one photo and returns it.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle and
    /// `RoundError::NoMorePhotos` when the cursor is on the last photo; the
    /// cursor is left where it was in both cases.
    pub fn advance(&mut self) -> Result<&Photo, RoundError> {
        let round = self.active.as_mut().ok_or(RoundError::NotStarted)?;
        let next = round.index + 1;
        if next >= round.situation.photos.len() {
            return Err(RoundError::NoMorePhotos);
        }
        round.index = next;
        Ok(&round.situation.photos[next])
    }

    /// The answer of the active situation.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle.
    pub fn answer(&self) -> Result<&str, RoundError> {
        Ok(&self.active()?.situation.situation.answer)
    }

    /// Cursor position, 1-based.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle.
    pub fn progress(&self) -> Result<PhotoProgress, RoundError> {
        let round = self.active()?;
        Ok(PhotoProgress {
            current: round.index + 1,
            total: round.situation.photos.len(),
        })
    }

    /// Photo, situation, and cursor together.
    #[must_use]
    pub fn snapshot(&self) -> Option<RoundSnapshot> {
        let round = self.active.as_ref()?;
        Some(RoundSnapshot {
            situation_id: round.situation.situation.id,
            photo: round.situation.photos[round.index].clone(),
            progress: PhotoProgress {
                current: round.index + 1,
                total: round.situation.photos.len(),
            },
        })
    }

    /// Returns to idle.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
