//! Photo Quiz — multiplayer session layer.
//!
//! Tracks the player roster, turn order, and cumulative scores for one
//! game, and signals the end of each turn over a bounded best-effort
//! channel.

pub mod application;
pub mod domain;

pub use application::manager::SessionManager;
pub use application::turn_events::{
    PublishOutcome, TURN_END_CHANNEL_CAPACITY, TurnEndPublisher, TurnEndReceiver, TurnEnded,
    turn_end_channel,
};
pub use domain::player::{Player, PlayerScore};
pub use domain::score::Score;
pub use domain::session::GameSession;
