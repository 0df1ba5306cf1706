//! The session manager.
//!
//! One optional [`GameSession`] behind a `parking_lot::RwLock`. Every
//! mutation holds the write half for its full duration; lookups take the
//! read half. Nothing here touches I/O, so operations complete in bounded
//! time and are not cancellable. Absence of a session is reported as
//! `None`, never as an error.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use photoquiz_core::clock::Clock;
use photoquiz_core::rng::DeterministicRng;
use tracing::{debug, info};

use super::turn_events::{PublishOutcome, TurnEndPublisher, TurnEnded};
use crate::domain::player::{Player, PlayerScore};
use crate::domain::score::Score;
use crate::domain::session::GameSession;

/// Owns the single session for one game instance.
pub struct SessionManager {
    session: RwLock<Option<GameSession>>,
    rng: Mutex<Box<dyn DeterministicRng>>,
    clock: Arc<dyn Clock>,
    turn_events: TurnEndPublisher,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager with no session.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        turn_events: TurnEndPublisher,
    ) -> Self {
        Self {
            session: RwLock::new(None),
            rng: Mutex::new(rng),
            clock,
            turn_events,
        }
    }

    /// Starts a new session from `names`, replacing any existing one.
    ///
    /// Returns `None` and leaves the current session untouched when `names`
    /// is empty.
    pub fn create_session(&self, names: &[String]) -> Option<GameSession> {
        let mut slot = self.session.write();
        let created = {
            let mut rng = self.rng.lock();
            GameSession::new(names, &mut **rng, self.clock.as_ref())?
        };
        info!(
            session_id = %created.id,
            players = created.players.len(),
            "session created"
        );
        *slot = Some(created.clone());
        Some(created)
    }

    /// The current session, if any.
    pub fn get_session(&self) -> Option<GameSession> {
        self.session.read().clone()
    }

    /// The player holding the turn, if any.
    pub fn get_current_player(&self) -> Option<Player> {
        self.session.read().as_ref()?.current_player().cloned()
    }

    /// Passes the turn on and returns the new current player. `None` when
    /// there is no session or it has finished.
    pub fn next_player(&self) -> Option<Player> {
        let mut slot = self.session.write();
        let session = slot.as_mut().filter(|s| s.is_active)?;
        let next = session.advance_turn()?.clone();
        debug!(
            player = %next.name,
            round = session.current_round,
            "turn passed"
        );
        Some(next)
    }

    /// Adds `delta` to the current player's score. Whether `delta` is a
    /// legal award is the caller's concern. `None` when there is no
    /// session or it has finished.
    pub fn add_score_to_current_player(&self, delta: Score) -> Option<Player> {
        let mut slot = self.session.write();
        let session = slot.as_mut().filter(|s| s.is_active)?;
        let player = session.add_score_to_current(delta)?.clone();
        info!(player = %player.name, %delta, total = %player.score, "score added");
        Some(player)
    }

    /// Leaderboard, highest first, ties in turn order.
    pub fn get_scoreboard(&self) -> Option<Vec<PlayerScore>> {
        Some(self.session.read().as_ref()?.scoreboard())
    }

    /// Ends the game and returns the final standings.
    pub fn finish_game(&self) -> Option<Vec<PlayerScore>> {
        let mut slot = self.session.write();
        let session = slot.as_mut()?;
        let standings = session.finish();
        info!(session_id = %session.id, "game finished");
        Some(standings)
    }

    /// Discards the session unconditionally.
    pub fn reset_session(&self) {
        if let Some(discarded) = self.session.write().take() {
            info!(session_id = %discarded.id, "session discarded");
        }
    }

    /// Whether a session exists and is still being played.
    pub fn has_active_session(&self) -> bool {
        self.session.read().as_ref().is_some_and(|s| s.is_active)
    }

    /// Announces that the current player's turn ended.
    ///
    /// The send never blocks; a full queue drops the event. Returns `None`
    /// when there is no current player, the same condition under which
    /// [`Self::get_current_player`] returns `None`. A finished session still
    /// has one, so the last turn of a game is announced too.
    pub fn notify_turn_end(&self) -> Option<PublishOutcome> {
        let event = {
            let slot = self.session.read();
            let session = slot.as_ref()?;
            TurnEnded {
                player_name: session.current_player()?.name.clone(),
                session_id: session.id,
            }
        };
        Some(self.turn_events.publish(event))
    }
}
