//! The game session aggregate.
//!
//! `players` is always kept in turn order and each player's `order`
//! equals its index. While the session is active `current_player_id`
//! names exactly one of them.

use chrono::{DateTime, Utc};
use photoquiz_core::clock::Clock;
use photoquiz_core::rng::{DeterministicRng, shuffle};
use serde::Serialize;
use uuid::Uuid;

use super::player::{Player, PlayerScore};
use super::score::Score;

/// A multiplayer game: roster, whose turn it is, and the round counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// Session identifier.
    pub id: Uuid,
    /// Players in turn order.
    pub players: Vec<Player>,
    /// The player holding the turn.
    pub current_player_id: Uuid,
    /// Starts at 1 and grows by one per turn handover.
    pub current_round: u32,
    /// Cleared by `finish`.
    pub is_active: bool,
    /// Set by `finish`.
    pub is_finished: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    /// Builds a session from display names. Turn order is a uniform random
    /// permutation of `names`; the first player after shuffling starts.
    ///
    /// Returns `None` when `names` is empty.
    #[must_use]
    pub fn new(names: &[String], rng: &mut dyn DeterministicRng, clock: &dyn Clock) -> Option<Self> {
        let mut players: Vec<Player> = names
            .iter()
            .enumerate()
            .map(|(order, name)| Player {
                id: Uuid::new_v4(),
                name: name.clone(),
                score: Score::ZERO,
                order,
            })
            .collect();

        shuffle(rng, &mut players);
        for (order, player) in players.iter_mut().enumerate() {
            player.order = order;
        }

        let first = players.first()?.id;
        Some(Self {
            id: Uuid::new_v4(),
            players,
            current_player_id: first,
            current_round: 1,
            is_active: true,
            is_finished: false,
            created_at: clock.now(),
        })
    }

    fn current_index(&self) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.id == self.current_player_id)
    }

    /// The player holding the turn.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_index()?)
    }

    /// Hands the turn to the next player, wrapping from last to first, and
    /// bumps the round counter.
    pub fn advance_turn(&mut self) -> Option<&Player> {
        let next = (self.current_index()? + 1) % self.players.len();
        self.current_player_id = self.players[next].id;
        self.current_round += 1;
        self.players.get(next)
    }

    /// Adds `delta` to the current player's score.
    pub fn add_score_to_current(&mut self, delta: Score) -> Option<&Player> {
        let index = self.current_index()?;
        let player = &mut self.players[index];
        player.score = player.score.saturating_add(delta);
        Some(player)
    }

    /// Leaderboard, highest score first. Ties keep turn order.
    #[must_use]
    pub fn scoreboard(&self) -> Vec<PlayerScore> {
        let mut rows: Vec<PlayerScore> = self
            .players
            .iter()
            .map(|p| PlayerScore {
                name: p.name.clone(),
                score: p.score,
                is_current_player: p.id == self.current_player_id,
            })
            .collect();
        // `sort_by` is stable, which is what preserves turn order on ties.
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    /// Ends the game and returns the final standings without the
    /// current-player marker.
    pub fn finish(&mut self) -> Vec<PlayerScore> {
        self.is_active = false;
        self.is_finished = true;
        let mut rows = self.scoreboard();
        for row in &mut rows {
            row.is_current_player = false;
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use photoquiz_test_support::{FixedClock, MockRng, SequenceRng};

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn session_in_order(list: &[&str]) -> GameSession {
        GameSession::new(&names(list), &mut MockRng, &FixedClock::reference()).unwrap()
    }

    #[test]
    fn test_new_builds_fresh_active_session() {
        let clock = FixedClock::reference();

        let session = GameSession::new(&names(&["A", "B", "C"]), &mut MockRng, &clock).unwrap();

        let roster: HashSet<_> = session.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(roster, HashSet::from(["A", "B", "C"]));
        assert_eq!(session.current_round, 1);
        assert!(session.is_active);
        assert!(!session.is_finished);
        assert_eq!(session.created_at, clock.0);
        assert_eq!(session.current_player().unwrap().id, session.players[0].id);
        let ids: HashSet<_> = session.players.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_new_restamps_order_after_shuffle() {
        // i=2 draws 0 (swap C,A), i=1 draws 0 (swap B,C): B C A
        let mut rng = SequenceRng::new(vec![0, 0]);

        let session =
            GameSession::new(&names(&["A", "B", "C"]), &mut rng, &FixedClock::reference()).unwrap();

        let ordered: Vec<_> = session
            .players
            .iter()
            .map(|p| (p.name.as_str(), p.order))
            .collect();
        assert_eq!(ordered, vec![("B", 0), ("C", 1), ("A", 2)]);
        assert_eq!(session.current_player().unwrap().name, "B");
    }

    #[test]
    fn test_new_rejects_empty_roster() {
        assert!(GameSession::new(&[], &mut MockRng, &FixedClock::reference()).is_none());
    }

    #[test]
    fn test_advance_turn_wraps_and_counts_rounds() {
        let mut session = session_in_order(&["A", "B", "C"]);
        let start = session.current_player_id;

        let seen: Vec<_> = (0..3)
            .map(|_| session.advance_turn().unwrap().name.clone())
            .collect();

        assert_eq!(seen, vec!["B", "C", "A"]);
        assert_eq!(session.current_player_id, start);
        assert_eq!(session.current_round, 4);
    }

    #[test]
    fn test_add_score_only_touches_current_player() {
        let mut session = session_in_order(&["A", "B"]);

        session.add_score_to_current(Score::from_points(1.5).unwrap());
        let updated = session
            .add_score_to_current(Score::from_points(0.5).unwrap())
            .unwrap()
            .clone();

        assert_eq!(updated.name, "A");
        assert_eq!(updated.score, Score::from_points(2.0).unwrap());
        assert_eq!(session.players[1].score, Score::ZERO);
    }

    #[test]
    fn test_scoreboard_is_stable_descending() {
        // Turn order A, B, C with scores 1, 2, 1.
        let mut session = session_in_order(&["A", "B", "C"]);
        session.add_score_to_current(Score::from_points(1.0).unwrap());
        session.advance_turn();
        session.add_score_to_current(Score::from_points(2.0).unwrap());
        session.advance_turn();
        session.add_score_to_current(Score::from_points(1.0).unwrap());

        let board = session.scoreboard();

        let rows: Vec<_> = board
            .iter()
            .map(|r| (r.name.as_str(), r.score.as_points(), r.is_current_player))
            .collect();
        assert_eq!(
            rows,
            vec![("B", 2.0, false), ("A", 1.0, false), ("C", 1.0, true)]
        );
    }

    #[test]
    fn test_finish_marks_session_and_drops_current_flag() {
        let mut session = session_in_order(&["A", "B"]);
        session.add_score_to_current(Score::from_points(0.5).unwrap());

        let standings = session.finish();

        assert!(!session.is_active);
        assert!(session.is_finished);
        assert_eq!(standings[0].name, "A");
        assert!(standings.iter().all(|r| !r.is_current_player));
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let session = session_in_order(&["A"]);

        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["currentRound"], 1);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["players"][0]["score"], 0.0);
        assert_eq!(
            json["currentPlayerId"],
            serde_json::Value::String(session.current_player_id.to_string())
        );
    }
}
