//! Test stores — fake `SituationStore` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use photoquiz_core::cancel::run_cancellable;
use photoquiz_core::error::StoreError;
use photoquiz_core::situation::{
    MAX_PHOTOS_PER_SITUATION, Photo, Situation, SituationId, SituationStats, SituationWithPhotos,
};
use photoquiz_core::store::SituationStore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Inner {
    situations: Vec<Situation>,
    photos: Vec<Photo>,
    next_situation_id: i64,
    next_photo_id: i64,
    marked: Vec<SituationId>,
    draws: usize,
}

impl Inner {
    fn with_photos(&self, situation: &Situation) -> SituationWithPhotos {
        let photos = self
            .photos
            .iter()
            .filter(|p| p.situation_id == situation.id)
            .cloned()
            .collect();
        SituationWithPhotos::new(situation.clone(), photos)
    }

    fn insert_situation(&mut self, answer: &str, now: DateTime<Utc>) -> SituationId {
        self.next_situation_id += 1;
        let id = self.next_situation_id;
        self.situations.push(Situation {
            id,
            answer: answer.to_owned(),
            is_used: false,
            created_at: now,
        });
        id
    }

    fn insert_photo(&mut self, situation_id: SituationId, file_id: &str, now: DateTime<Utc>) -> Photo {
        self.next_photo_id += 1;
        let sort_order = self
            .photos
            .iter()
            .filter(|p| p.situation_id == situation_id)
            .map(|p| p.sort_order)
            .max()
            .map_or(0, |max| max + 1);
        let photo = Photo {
            id: self.next_photo_id,
            situation_id,
            file_id: file_id.to_owned(),
            sort_order,
            created_at: now,
        };
        self.photos.push(photo.clone());
        photo
    }
}

/// An in-memory situation store.
///
/// Draws are deterministic: the unused situation with the lowest id is
/// returned. Every `mark_as_used` call is recorded so tests can assert on
/// the order situations were retired. An optional per-call delay lets
/// tests exercise cancellation and lock contention.
#[derive(Debug, Default)]
pub struct InMemorySituationStore {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl InMemorySituationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every store call sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Seeds a situation whose photos carry the given file references.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed(&self, answer: &str, file_ids: &[&str]) -> SituationId {
        let mut inner = self.inner.lock().unwrap();
        let now = seed_time();
        let id = inner.insert_situation(answer, now);
        for file_id in file_ids {
            inner.insert_photo(id, file_id, now);
        }
        id
    }

    /// Situation ids passed to `mark_as_used`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn marked_as_used(&self) -> Vec<SituationId> {
        self.inner.lock().unwrap().marked.clone()
    }

    /// Number of `get_random_unused` calls served.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn draw_count(&self) -> usize {
        self.inner.lock().unwrap().draws
    }

    /// Whether the given situation is currently flagged as used.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_used(&self, situation_id: SituationId) -> bool {
        self.inner
            .lock()
            .unwrap()
            .situations
            .iter()
            .any(|s| s.id == situation_id && s.is_used)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

#[async_trait]
impl SituationStore for InMemorySituationStore {
    async fn get_random_unused(
        &self,
        excluding: Option<SituationId>,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let mut inner = self.inner.lock().unwrap();
            inner.draws += 1;
            let found = inner
                .situations
                .iter()
                .filter(|s| !s.is_used && Some(s.id) != excluding)
                .min_by_key(|s| s.id)
                .cloned();
            Ok(found.map(|s| inner.with_photos(&s)))
        })
        .await
    }

    async fn mark_as_used(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let mut inner = self.inner.lock().unwrap();
            inner.marked.push(situation_id);
            if let Some(s) = inner.situations.iter_mut().find(|s| s.id == situation_id) {
                s.is_used = true;
            }
            Ok(())
        })
        .await
    }

    async fn reset_all_used(&self, cancel: &CancellationToken) -> Result<(), StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let mut inner = self.inner.lock().unwrap();
            for s in &mut inner.situations {
                s.is_used = false;
            }
            Ok(())
        })
        .await
    }

    async fn get_stats(&self, cancel: &CancellationToken) -> Result<SituationStats, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let inner = self.inner.lock().unwrap();
            let total = i64::try_from(inner.situations.len()).unwrap_or(i64::MAX);
            let used = i64::try_from(inner.situations.iter().filter(|s| s.is_used).count())
                .unwrap_or(i64::MAX);
            Ok(SituationStats::from_counts(total, used))
        })
        .await
    }

    async fn create_situation(
        &self,
        answer: &str,
        cancel: &CancellationToken,
    ) -> Result<SituationId, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            Ok(self.inner.lock().unwrap().insert_situation(answer, Utc::now()))
        })
        .await
    }

    async fn add_photo(
        &self,
        situation_id: SituationId,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Photo, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let mut inner = self.inner.lock().unwrap();
            if !inner.situations.iter().any(|s| s.id == situation_id) {
                return Err(StoreError::Validation(format!(
                    "situation {situation_id} does not exist"
                )));
            }
            let attached = inner
                .photos
                .iter()
                .filter(|p| p.situation_id == situation_id)
                .count();
            if attached >= MAX_PHOTOS_PER_SITUATION {
                return Err(StoreError::Validation(format!(
                    "situation {situation_id} already has {MAX_PHOTOS_PER_SITUATION} photos"
                )));
            }
            Ok(inner.insert_photo(situation_id, file_id, Utc::now()))
        })
        .await
    }

    async fn create_with_photos(
        &self,
        answer: &str,
        file_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<SituationWithPhotos, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            if file_ids.len() > MAX_PHOTOS_PER_SITUATION {
                return Err(StoreError::Validation(format!(
                    "a situation holds at most {MAX_PHOTOS_PER_SITUATION} photos"
                )));
            }
            let mut inner = self.inner.lock().unwrap();
            let now = Utc::now();
            let id = inner.insert_situation(answer, now);
            for file_id in file_ids {
                inner.insert_photo(id, file_id, now);
            }
            let situation = inner
                .situations
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| StoreError::Database("inserted situation vanished".to_owned()))?;
            Ok(inner.with_photos(&situation))
        })
        .await
    }

    async fn count_photos(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<i64, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let inner = self.inner.lock().unwrap();
            let count = inner
                .photos
                .iter()
                .filter(|p| p.situation_id == situation_id)
                .count();
            Ok(i64::try_from(count).unwrap_or(i64::MAX))
        })
        .await
    }

    async fn get_by_id(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let inner = self.inner.lock().unwrap();
            let found = inner
                .situations
                .iter()
                .find(|s| s.id == situation_id)
                .cloned();
            Ok(found.map(|s| inner.with_photos(&s)))
        })
        .await
    }

    async fn delete_all(&self, cancel: &CancellationToken) -> Result<u64, StoreError> {
        run_cancellable(cancel, async {
            self.pause().await;
            let mut inner = self.inner.lock().unwrap();
            let count = inner.situations.len() as u64;
            inner.situations.clear();
            inner.photos.clear();
            Ok(count)
        })
        .await
    }
}

/// A store that always fails with a database error. Useful for testing
/// error-propagation paths.
#[derive(Debug)]
pub struct FailingSituationStore;

fn connection_refused<T>() -> Result<T, StoreError> {
    Err(StoreError::Database("connection refused".into()))
}

#[async_trait]
impl SituationStore for FailingSituationStore {
    async fn get_random_unused(
        &self,
        _excluding: Option<SituationId>,
        _cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        connection_refused()
    }

    async fn mark_as_used(
        &self,
        _situation_id: SituationId,
        _cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        connection_refused()
    }

    async fn reset_all_used(&self, _cancel: &CancellationToken) -> Result<(), StoreError> {
        connection_refused()
    }

    async fn get_stats(&self, _cancel: &CancellationToken) -> Result<SituationStats, StoreError> {
        connection_refused()
    }

    async fn create_situation(
        &self,
        _answer: &str,
        _cancel: &CancellationToken,
    ) -> Result<SituationId, StoreError> {
        connection_refused()
    }

    async fn add_photo(
        &self,
        _situation_id: SituationId,
        _file_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<Photo, StoreError> {
        connection_refused()
    }

    async fn create_with_photos(
        &self,
        _answer: &str,
        _file_ids: &[String],
        _cancel: &CancellationToken,
    ) -> Result<SituationWithPhotos, StoreError> {
        connection_refused()
    }

    async fn count_photos(
        &self,
        _situation_id: SituationId,
        _cancel: &CancellationToken,
    ) -> Result<i64, StoreError> {
        connection_refused()
    }

    async fn get_by_id(
        &self,
        _situation_id: SituationId,
        _cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        connection_refused()
    }

    async fn delete_all(&self, _cancel: &CancellationToken) -> Result<u64, StoreError> {
        connection_refused()
    }
}
