//! The round engine.
//!
//! All round state sits behind one `tokio::sync::RwLock`. Mutating
//! operations hold the write half for their full duration, including the
//! store calls they make, so a slow store serializes every round
//! operation in the process. Pure readers take the read half.

use std::sync::Arc;

use photoquiz_core::situation::{Photo, SituationStats};
use photoquiz_core::store::SituationStore;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::RoundError;
use crate::domain::round_state::{PhotoProgress, RoundSnapshot, RoundState};

/// Owns the single active round for one game instance.
pub struct RoundEngine {
    store: Arc<dyn SituationStore>,
    state: RwLock<RoundState>,
}

impl std::fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine").finish_non_exhaustive()
    }
}

impl RoundEngine {
    /// Creates an idle engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SituationStore>) -> Self {
        Self {
            store,
            state: RwLock::new(RoundState::default()),
        }
    }

    /// Draws an unused situation and shows its first photo.
    ///
    /// Situations without photos are retired on the spot and the draw is
    /// repeated. Each pass removes one situation from the unused pool, so
    /// the loop ends once the store reports exhaustion. A round that is
    /// still active stays out of the draw and is retired only once its
    /// replacement is in hand.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NoSituationsAvailable` when the store has no
    /// other unused situation left, or the store's error unchanged. On any
    /// error the active round, if there is one, stays as it was.
    #[instrument(skip_all)]
    pub async fn start_new_round(&self, cancel: &CancellationToken) -> Result<Photo, RoundError> {
        let mut state = self.state.write().await;
        let active = state.situation_id();

        let started = loop {
            let Some(candidate) = self.store.get_random_unused(active, cancel).await? else {
                info!("situation pool exhausted");
                return Err(RoundError::NoSituationsAvailable);
            };
            match RoundState::start(candidate) {
                Ok(started) => break started,
                Err(unplayable) => {
                    let situation_id = unplayable.situation.id;
                    warn!(situation_id, "skipping situation without photos");
                    self.store.mark_as_used(situation_id, cancel).await?;
                }
            }
        };

        if let Some(abandoned) = active {
            debug!(situation_id = abandoned, "retiring unfinished round");
            self.store.mark_as_used(abandoned, cancel).await?;
        }

        *state = started;
        let photo = state.current_photo()?.clone();
        info!(situation_id = photo.situation_id, "round started");
        Ok(photo)
    }

    /// Reveals the next photo of the active round.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle, or
    /// `RoundError::NoMorePhotos` when already on the last photo.
    #[instrument(skip_all)]
    pub async fn next_photo(&self) -> Result<Photo, RoundError> {
        let mut state = self.state.write().await;
        let photo = state.advance()?.clone();
        debug!(photo_id = photo.id, "advanced to next photo");
        Ok(photo)
    }

    /// The active situation's answer. Does not change state.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle.
    pub async fn get_answer(&self) -> Result<String, RoundError> {
        let state = self.state.read().await;
        state.answer().map(str::to_owned)
    }

    /// Retires the active situation and returns to idle.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle, or the store's error
    /// unchanged, in which case the round stays active.
    #[instrument(skip_all)]
    pub async fn finish_round(&self, cancel: &CancellationToken) -> Result<(), RoundError> {
        let mut state = self.state.write().await;
        let situation_id = state.situation_id().ok_or(RoundError::NotStarted)?;
        self.store.mark_as_used(situation_id, cancel).await?;
        state.clear();
        info!(situation_id, "round finished");
        Ok(())
    }

    /// Clears the active round and returns every situation to the pool.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged. The round is cleared either way.
    #[instrument(skip_all)]
    pub async fn reset_game(&self, cancel: &CancellationToken) -> Result<(), RoundError> {
        let mut state = self.state.write().await;
        state.clear();
        self.store.reset_all_used(cancel).await?;
        info!("game reset");
        Ok(())
    }

    /// Pool counters, straight from the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_stats(&self, cancel: &CancellationToken) -> Result<SituationStats, RoundError> {
        Ok(self.store.get_stats(cancel).await?)
    }

    /// 1-based cursor position and photo count.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::NotStarted` when idle.
    pub async fn get_current_photo_info(&self) -> Result<PhotoProgress, RoundError> {
        self.state.read().await.progress()
    }

    /// Situation, photo, and cursor read under one lock acquisition.
    pub async fn snapshot(&self) -> Option<RoundSnapshot> {
        self.state.read().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use photoquiz_core::error::StoreError;
    use photoquiz_test_support::{FailingSituationStore, InMemorySituationStore};

    use super::*;

    fn engine_with(store: &Arc<InMemorySituationStore>) -> RoundEngine {
        RoundEngine::new(store.clone())
    }

    #[tokio::test]
    async fn test_start_new_round_returns_first_photo() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        let id = store.seed("eiffel tower", &["p0", "p1", "p2"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();

        // Act
        let photo = engine.start_new_round(&cancel).await.unwrap();

        // Assert
        assert_eq!(photo.situation_id, id);
        assert_eq!(photo.file_id, "p0");
        assert_eq!(
            engine.get_current_photo_info().await.unwrap(),
            PhotoProgress {
                current: 1,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn test_start_new_round_fails_when_pool_is_empty() {
        let store = Arc::new(InMemorySituationStore::new());
        let engine = engine_with(&store);

        let result = engine.start_new_round(&CancellationToken::new()).await;

        assert_eq!(result, Err(RoundError::NoSituationsAvailable));
    }

    #[tokio::test]
    async fn test_start_new_round_skips_and_retires_situations_without_photos() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        let empty_a = store.seed("nothing", &[]);
        let empty_b = store.seed("still nothing", &[]);
        let playable = store.seed("bridge", &["b0", "b1"]);
        let engine = engine_with(&store);

        // Act
        let photo = engine
            .start_new_round(&CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(photo.situation_id, playable);
        assert_eq!(store.marked_as_used(), vec![empty_a, empty_b]);
        assert!(store.is_used(empty_a));
        assert!(!store.is_used(playable));
    }

    #[tokio::test]
    async fn test_start_new_round_reports_exhaustion_after_only_empty_situations() {
        let store = Arc::new(InMemorySituationStore::new());
        store.seed("a", &[]);
        store.seed("b", &[]);
        let engine = engine_with(&store);

        let result = engine.start_new_round(&CancellationToken::new()).await;

        assert_eq!(result, Err(RoundError::NoSituationsAvailable));
        assert_eq!(store.draw_count(), 3);
        assert_eq!(engine.get_answer().await, Err(RoundError::NotStarted));
    }

    #[tokio::test]
    async fn test_failed_restart_keeps_active_round() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        let id = store.seed("only one", &["o0", "o1"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        engine.start_new_round(&cancel).await.unwrap();
        engine.next_photo().await.unwrap();

        // Act
        let result = engine.start_new_round(&cancel).await;

        // Assert
        assert_eq!(result, Err(RoundError::NoSituationsAvailable));
        assert_eq!(engine.get_answer().await.unwrap(), "only one");
        assert_eq!(engine.get_current_photo_info().await.unwrap().current, 2);
        assert!(!store.is_used(id));
    }

    #[tokio::test]
    async fn test_restart_retires_abandoned_round_after_drawing_replacement() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        let first = store.seed("first", &["f0"]);
        let empty = store.seed("empty", &[]);
        let second = store.seed("second", &["s0"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        engine.start_new_round(&cancel).await.unwrap();

        // Act
        let photo = engine.start_new_round(&cancel).await.unwrap();

        // Assert
        assert_eq!(photo.situation_id, second);
        assert_eq!(store.marked_as_used(), vec![empty, first]);
        assert!(!store.is_used(second));
    }

    #[tokio::test]
    async fn test_cancelled_restart_keeps_active_round() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        store.seed("kept", &["k0"]);
        store.seed("other", &["x0"]);
        let engine = engine_with(&store);
        engine
            .start_new_round(&CancellationToken::new())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Act
        let result = engine.start_new_round(&cancel).await;

        // Assert
        assert_eq!(result, Err(RoundError::Store(StoreError::Cancelled)));
        assert_eq!(engine.get_answer().await.unwrap(), "kept");
        assert!(store.marked_as_used().is_empty());
    }

    #[tokio::test]
    async fn test_next_photo_succeeds_len_minus_one_times_then_fails() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        store.seed("four photos", &["a", "b", "c", "d"]);
        let engine = engine_with(&store);
        engine
            .start_new_round(&CancellationToken::new())
            .await
            .unwrap();

        // Act
        let mut successes = 0;
        let mut failures = 0;
        for _ in 0..4 {
            match engine.next_photo().await {
                Ok(_) => successes += 1,
                Err(RoundError::NoMorePhotos) => failures += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        // Assert
        assert_eq!(successes, 3);
        assert_eq!(failures, 1);
        assert_eq!(engine.next_photo().await, Err(RoundError::NoMorePhotos));
        assert_eq!(engine.get_current_photo_info().await.unwrap().current, 4);
    }

    #[tokio::test]
    async fn test_photo_info_tracks_successful_advances() {
        let store = Arc::new(InMemorySituationStore::new());
        store.seed("five", &["a", "b", "c", "d", "e"]);
        let engine = engine_with(&store);
        engine
            .start_new_round(&CancellationToken::new())
            .await
            .unwrap();

        for k in 1..=4 {
            engine.next_photo().await.unwrap();
            assert_eq!(engine.get_current_photo_info().await.unwrap().current, k + 1);
        }
    }

    #[tokio::test]
    async fn test_finish_round_retires_situation_and_goes_idle() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        let id = store.seed("harbour", &["h0"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        engine.start_new_round(&cancel).await.unwrap();
        assert_eq!(engine.get_answer().await.unwrap(), "harbour");

        // Act
        engine.finish_round(&cancel).await.unwrap();

        // Assert
        assert!(store.is_used(id));
        assert_eq!(engine.get_answer().await, Err(RoundError::NotStarted));
        assert_eq!(engine.next_photo().await, Err(RoundError::NotStarted));
        assert_eq!(
            engine.finish_round(&cancel).await,
            Err(RoundError::NotStarted)
        );
        assert_eq!(
            engine.get_current_photo_info().await,
            Err(RoundError::NotStarted)
        );
    }

    #[tokio::test]
    async fn test_rounds_never_repeat_a_situation_until_reset() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        for i in 0..5 {
            store.seed(&format!("answer {i}"), &["x"]);
        }
        store.seed("no photos", &[]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        let mut seen = HashSet::new();

        // Act
        loop {
            match engine.start_new_round(&cancel).await {
                Ok(photo) => {
                    assert!(seen.insert(photo.situation_id), "situation drawn twice");
                    // Alternate between finishing and abandoning rounds.
                    if seen.len() % 2 == 0 {
                        engine.finish_round(&cancel).await.unwrap();
                    }
                }
                Err(RoundError::NoSituationsAvailable) => break,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        // Assert
        assert_eq!(seen.len(), 5);
        engine.reset_game(&cancel).await.unwrap();
        assert!(engine.start_new_round(&cancel).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_game_clears_round_and_restores_pool() {
        let store = Arc::new(InMemorySituationStore::new());
        let id = store.seed("tram", &["t0"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        engine.start_new_round(&cancel).await.unwrap();
        engine.finish_round(&cancel).await.unwrap();

        engine.reset_game(&cancel).await.unwrap();

        assert!(!store.is_used(id));
        assert_eq!(engine.get_answer().await, Err(RoundError::NotStarted));
        // Idempotent with no active round.
        engine.reset_game(&cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_stats_delegates_to_store() {
        let store = Arc::new(InMemorySituationStore::new());
        store.seed("a", &["a0"]);
        store.seed("b", &["b0"]);
        store.seed("c", &["c0"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        engine.start_new_round(&cancel).await.unwrap();
        engine.finish_round(&cancel).await.unwrap();

        let stats = engine.get_stats(&cancel).await.unwrap();

        assert_eq!(stats, SituationStats::from_counts(3, 1));
        assert_eq!(stats.remaining, 2);
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unchanged() {
        let engine = RoundEngine::new(Arc::new(FailingSituationStore));
        let cancel = CancellationToken::new();
        let expected = RoundError::Store(StoreError::Database("connection refused".into()));

        assert_eq!(engine.start_new_round(&cancel).await, Err(expected.clone()));
        assert_eq!(engine.reset_game(&cancel).await, Err(expected.clone()));
        assert_eq!(engine.get_stats(&cancel).await, Err(expected));
        assert_eq!(
            engine.finish_round(&cancel).await,
            Err(RoundError::NotStarted)
        );
    }

    #[tokio::test]
    async fn test_cancelled_start_leaves_engine_idle() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new().with_delay(Duration::from_secs(30)));
        store.seed("slow", &["s0"]);
        let engine = engine_with(&store);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        // Act
        let result = engine.start_new_round(&cancel).await;

        // Assert
        assert_eq!(result, Err(RoundError::Store(StoreError::Cancelled)));
        assert!(engine.snapshot().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_never_observe_torn_state() {
        // Arrange
        let store = Arc::new(InMemorySituationStore::new());
        for i in 0..40 {
            let photos: Vec<String> = (0..=(i % 5)).map(|p| format!("s{i}-p{p}")).collect();
            let refs: Vec<&str> = photos.iter().map(String::as_str).collect();
            store.seed(&format!("answer {i}"), &refs);
        }
        let engine = Arc::new(engine_with(&store));

        // Act
        let mut handles = Vec::new();
        for worker in 0..8_u32 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                for step in 0..60_u32 {
                    let result = match (worker + step) % 5 {
                        0 => engine.start_new_round(&cancel).await.map(|_| ()),
                        1 | 2 => engine.next_photo().await.map(|_| ()),
                        3 => engine.finish_round(&cancel).await,
                        _ => engine.get_answer().await.map(|_| ()),
                    };
                    match result {
                        Ok(())
                        | Err(
                            RoundError::NotStarted
                            | RoundError::NoMorePhotos
                            | RoundError::NoSituationsAvailable,
                        ) => {}
                        Err(other) => panic!("unexpected error {other:?}"),
                    }

                    if let Some(snapshot) = engine.snapshot().await {
                        assert_eq!(snapshot.photo.situation_id, snapshot.situation_id);
                        assert_eq!(
                            usize::try_from(snapshot.photo.sort_order).unwrap() + 1,
                            snapshot.progress.current
                        );
                        assert!(snapshot.progress.current <= snapshot.progress.total);
                    }
                }
            }));
        }

        // Assert
        for handle in handles {
            handle.await.unwrap();
        }
        let retired = store.marked_as_used();
        let unique: HashSet<_> = retired.iter().copied().collect();
        assert_eq!(unique.len(), retired.len(), "a situation was retired twice");
    }
}
