//! Background consumer of turn-completion events.

use photoquiz_session::{TurnEndReceiver, TurnEnded};
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns the task that drains `receiver`. It finishes once every
/// publisher is dropped and yields the number of events it handled.
pub fn spawn(receiver: TurnEndReceiver) -> JoinHandle<usize> {
    tokio::spawn(receiver.run(announce))
}

fn announce(event: TurnEnded) {
    info!(
        player = %event.player_name,
        session_id = %event.session_id,
        "turn ended, awaiting score"
    );
}
