//! Turn-completion channel.
//!
//! A bounded multi-producer queue. Publishing never waits: when the queue
//! is full (or nobody is listening any more) the event is dropped and the
//! caller carries on. Delivery is at most once.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use uuid::Uuid;

/// Queue depth used by the application.
pub const TURN_END_CHANNEL_CAPACITY: usize = 10;

/// "This player's turn just ended."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEnded {
    /// Name of the player whose turn ended.
    pub player_name: String,
    /// Session the turn belongs to.
    pub session_id: Uuid,
}

/// What happened to a published event. Dropping is an expected outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Queued for the consumer.
    Delivered,
    /// Discarded because the queue was full or closed.
    Dropped,
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TurnEndPublisher {
    tx: mpsc::Sender<TurnEnded>,
}

/// Receiving half. There is exactly one.
#[derive(Debug)]
pub struct TurnEndReceiver {
    rx: mpsc::Receiver<TurnEnded>,
}

/// Creates a connected publisher/receiver pair.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn turn_end_channel(capacity: usize) -> (TurnEndPublisher, TurnEndReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (TurnEndPublisher { tx }, TurnEndReceiver { rx })
}

impl TurnEndPublisher {
    /// Attempts a single non-blocking send.
    pub fn publish(&self, event: TurnEnded) -> PublishOutcome {
        match self.tx.try_send(event) {
            Ok(()) => PublishOutcome::Delivered,
            Err(TrySendError::Full(event)) => {
                debug!(
                    player = %event.player_name,
                    session_id = %event.session_id,
                    "turn-end queue full, dropping event"
                );
                PublishOutcome::Dropped
            }
            Err(TrySendError::Closed(event)) => {
                debug!(
                    player = %event.player_name,
                    session_id = %event.session_id,
                    "turn-end consumer gone, dropping event"
                );
                PublishOutcome::Dropped
            }
        }
    }
}

impl TurnEndReceiver {
    /// Waits for the next event. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<TurnEnded> {
        self.rx.recv().await
    }

    /// Takes an event if one is queued right now.
    pub fn try_recv(&mut self) -> Option<TurnEnded> {
        self.rx.try_recv().ok()
    }

    /// Feeds every event to `handler` until the channel closes, then
    /// returns how many were handled.
    pub async fn run<F>(mut self, mut handler: F) -> usize
    where
        F: FnMut(TurnEnded) + Send,
    {
        let mut handled = 0;
        while let Some(event) = self.rx.recv().await {
            handler(event);
            handled += 1;
        }
        debug!(handled, "turn-end channel closed");
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> TurnEnded {
        TurnEnded {
            player_name: name.to_owned(),
            session_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_publish_drops_once_full() {
        let (publisher, mut receiver) = turn_end_channel(2);

        assert_eq!(publisher.publish(event("a")), PublishOutcome::Delivered);
        assert_eq!(publisher.publish(event("b")), PublishOutcome::Delivered);
        assert_eq!(publisher.publish(event("c")), PublishOutcome::Dropped);

        assert_eq!(receiver.try_recv(), Some(event("a")));
        assert_eq!(receiver.try_recv(), Some(event("b")));
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_publish_after_receiver_dropped_is_silent() {
        let (publisher, receiver) = turn_end_channel(TURN_END_CHANNEL_CAPACITY);
        drop(receiver);

        assert_eq!(publisher.publish(event("a")), PublishOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_run_drains_until_publishers_are_gone() {
        let (publisher, receiver) = turn_end_channel(TURN_END_CHANNEL_CAPACITY);
        publisher.publish(event("a"));
        publisher.publish(event("b"));
        drop(publisher);

        let mut names = Vec::new();
        let handled = receiver.run(|e| names.push(e.player_name)).await;

        assert_eq!(handled, 2);
        assert_eq!(names, vec!["a", "b"]);
    }
}
