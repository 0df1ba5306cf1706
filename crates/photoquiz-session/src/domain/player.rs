//! Players and leaderboard rows.

use serde::Serialize;
use uuid::Uuid;

use super::score::Score;

/// A participant in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Identity, unique within the session.
    pub id: Uuid,
    /// Display name as entered.
    pub name: String,
    /// Cumulative score.
    pub score: Score,
    /// Zero-based position in the turn sequence.
    pub order: usize,
}

/// Leaderboard projection of a [`Player`]. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    /// Display name.
    pub name: String,
    /// Cumulative score.
    pub score: Score,
    /// Whether this player currently holds the turn.
    pub is_current_player: bool,
}
