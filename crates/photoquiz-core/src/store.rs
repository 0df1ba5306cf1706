//! The situation store contract.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::situation::{Photo, SituationId, SituationStats, SituationWithPhotos};

/// Durable CRUD over situations and their photos.
///
/// Every call accepts the caller's cancellation token and must return
/// [`StoreError::Cancelled`] rather than complete once it fires.
#[async_trait]
pub trait SituationStore: Send + Sync {
    /// Draws one unused situation uniformly at random, with its photos.
    /// `excluding` is left out of the draw even while unused. `Ok(None)`
    /// means no other unused situation is left.
    async fn get_random_unused(
        &self,
        excluding: Option<SituationId>,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError>;

    /// Flags a situation as played.
    async fn mark_as_used(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;

    /// Returns every situation to the unused pool.
    async fn reset_all_used(&self, cancel: &CancellationToken) -> Result<(), StoreError>;

    /// Total and used counts.
    async fn get_stats(&self, cancel: &CancellationToken) -> Result<SituationStats, StoreError>;

    /// Creates a situation with no photos and returns its identifier.
    async fn create_situation(
        &self,
        answer: &str,
        cancel: &CancellationToken,
    ) -> Result<SituationId, StoreError>;

    /// Appends a photo at the next free sort position.
    ///
    /// Fails with [`StoreError::Validation`] when the situation does not
    /// exist or is already full. The limit is
    /// [`crate::situation::MAX_PHOTOS_PER_SITUATION`]; the check and the
    /// insert are one atomic step.
    async fn add_photo(
        &self,
        situation_id: SituationId,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Photo, StoreError>;

    /// Creates a situation and all of its photos atomically.
    async fn create_with_photos(
        &self,
        answer: &str,
        file_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<SituationWithPhotos, StoreError>;

    /// Number of photos attached to a situation.
    async fn count_photos(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<i64, StoreError>;

    /// Looks up one situation with its photos.
    async fn get_by_id(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError>;

    /// Deletes every situation (photos cascade) and returns how many went.
    async fn delete_all(&self, cancel: &CancellationToken) -> Result<u64, StoreError>;
}
