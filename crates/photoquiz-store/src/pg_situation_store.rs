//! `PostgreSQL` implementation of the `SituationStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photoquiz_core::cancel::run_cancellable;
use photoquiz_core::error::StoreError;
use photoquiz_core::situation::{
    MAX_PHOTOS_PER_SITUATION, Photo, Situation, SituationId, SituationStats, SituationWithPhotos,
};
use photoquiz_core::store::SituationStore;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

#[derive(Debug, FromRow)]
struct SituationRow {
    id: i64,
    answer: String,
    is_used: bool,
    created_at: DateTime<Utc>,
}

impl From<SituationRow> for Situation {
    fn from(row: SituationRow) -> Self {
        Self {
            id: row.id,
            answer: row.answer,
            is_used: row.is_used,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PhotoRow {
    id: i64,
    situation_id: i64,
    file_id: String,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            situation_id: row.situation_id,
            file_id: row.file_id,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

const SELECT_PHOTOS: &str = r"
SELECT id, situation_id, file_id, sort_order, created_at
  FROM photos
 WHERE situation_id = $1
 ORDER BY sort_order";

const INSERT_NEXT_PHOTO: &str = r"
INSERT INTO photos (situation_id, file_id, sort_order)
SELECT $1::BIGINT, $2::TEXT, COALESCE(MAX(sort_order), -1) + 1
  FROM photos
 WHERE situation_id = $1::BIGINT
RETURNING id, situation_id, file_id, sort_order, created_at";

/// PostgreSQL-backed situation store.
#[derive(Debug, Clone)]
pub struct PgSituationStore {
    pool: PgPool,
}

impl PgSituationStore {
    /// Creates a new `PgSituationStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, row: SituationRow) -> Result<SituationWithPhotos, StoreError> {
        let photos: Vec<PhotoRow> = sqlx::query_as(SELECT_PHOTOS)
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(SituationWithPhotos::new(
            row.into(),
            photos.into_iter().map(Photo::from).collect(),
        ))
    }

    async fn insert_situation(
        tx: &mut Transaction<'_, Postgres>,
        answer: &str,
    ) -> Result<SituationRow, StoreError> {
        sqlx::query_as(
            r"INSERT INTO situations (answer) VALUES ($1)
              RETURNING id, answer, is_used, created_at",
        )
        .bind(answer)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)
    }
}

#[async_trait]
impl SituationStore for PgSituationStore {
    #[instrument(skip_all)]
    async fn get_random_unused(
        &self,
        excluding: Option<SituationId>,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        run_cancellable(cancel, async {
            let row: Option<SituationRow> = sqlx::query_as(
                r"SELECT id, answer, is_used, created_at
                    FROM situations
                   WHERE is_used = FALSE
                     AND ($1::BIGINT IS NULL OR id <> $1::BIGINT)
                   ORDER BY RANDOM()
                   LIMIT 1",
            )
            .bind(excluding)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            match row {
                Some(row) => Ok(Some(self.load(row).await?)),
                None => Ok(None),
            }
        })
        .await
    }

    #[instrument(skip(self, cancel))]
    async fn mark_as_used(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        run_cancellable(cancel, async {
            sqlx::query("UPDATE situations SET is_used = TRUE WHERE id = $1")
                .bind(situation_id)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip_all)]
    async fn reset_all_used(&self, cancel: &CancellationToken) -> Result<(), StoreError> {
        run_cancellable(cancel, async {
            let result = sqlx::query("UPDATE situations SET is_used = FALSE")
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            debug!(rows = result.rows_affected(), "situations returned to pool");
            Ok(())
        })
        .await
    }

    async fn get_stats(&self, cancel: &CancellationToken) -> Result<SituationStats, StoreError> {
        run_cancellable(cancel, async {
            let (total, used): (i64, i64) = sqlx::query_as(
                "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_used = TRUE) FROM situations",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
            Ok(SituationStats::from_counts(total, used))
        })
        .await
    }

    #[instrument(skip_all)]
    async fn create_situation(
        &self,
        answer: &str,
        cancel: &CancellationToken,
    ) -> Result<SituationId, StoreError> {
        run_cancellable(cancel, async {
            sqlx::query_scalar("INSERT INTO situations (answer) VALUES ($1) RETURNING id")
                .bind(answer)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)
        })
        .await
    }

    #[instrument(skip(self, file_id, cancel))]
    async fn add_photo(
        &self,
        situation_id: SituationId,
        file_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Photo, StoreError> {
        run_cancellable(cancel, async {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            // Appends to one situation serialize on this row lock.
            let locked: Option<SituationId> =
                sqlx::query_scalar("SELECT id FROM situations WHERE id = $1 FOR UPDATE")
                    .bind(situation_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error)?;
            if locked.is_none() {
                return Err(StoreError::Validation(format!(
                    "situation {situation_id} does not exist"
                )));
            }

            let attached: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE situation_id = $1")
                    .bind(situation_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db_error)?;
            if usize::try_from(attached).unwrap_or(usize::MAX) >= MAX_PHOTOS_PER_SITUATION {
                return Err(StoreError::Validation(format!(
                    "situation {situation_id} already has {MAX_PHOTOS_PER_SITUATION} photos"
                )));
            }

            let row: PhotoRow = sqlx::query_as(INSERT_NEXT_PHOTO)
                .bind(situation_id)
                .bind(file_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;
            Ok(row.into())
        })
        .await
    }

    #[instrument(skip_all, fields(photos = file_ids.len()))]
    async fn create_with_photos(
        &self,
        answer: &str,
        file_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<SituationWithPhotos, StoreError> {
        run_cancellable(cancel, async {
            if file_ids.len() > MAX_PHOTOS_PER_SITUATION {
                return Err(StoreError::Validation(format!(
                    "a situation holds at most {MAX_PHOTOS_PER_SITUATION} photos"
                )));
            }
            let mut tx = self.pool.begin().await.map_err(db_error)?;
            let situation = Self::insert_situation(&mut tx, answer).await?;

            let mut photos = Vec::with_capacity(file_ids.len());
            for (position, file_id) in file_ids.iter().enumerate() {
                let sort_order = i32::try_from(position).map_err(|_| {
                    StoreError::Validation("photo position out of range".to_owned())
                })?;
                let row: PhotoRow = sqlx::query_as(
                    r"INSERT INTO photos (situation_id, file_id, sort_order)
                      VALUES ($1, $2, $3)
                      RETURNING id, situation_id, file_id, sort_order, created_at",
                )
                .bind(situation.id)
                .bind(file_id)
                .bind(sort_order)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
                photos.push(Photo::from(row));
            }

            tx.commit().await.map_err(db_error)?;
            debug!(situation_id = situation.id, "situation created");
            Ok(SituationWithPhotos::new(situation.into(), photos))
        })
        .await
    }

    async fn count_photos(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<i64, StoreError> {
        run_cancellable(cancel, async {
            sqlx::query_scalar("SELECT COUNT(*) FROM photos WHERE situation_id = $1")
                .bind(situation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)
        })
        .await
    }

    async fn get_by_id(
        &self,
        situation_id: SituationId,
        cancel: &CancellationToken,
    ) -> Result<Option<SituationWithPhotos>, StoreError> {
        run_cancellable(cancel, async {
            let row: Option<SituationRow> = sqlx::query_as(
                "SELECT id, answer, is_used, created_at FROM situations WHERE id = $1",
            )
            .bind(situation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            match row {
                Some(row) => Ok(Some(self.load(row).await?)),
                None => Ok(None),
            }
        })
        .await
    }

    #[instrument(skip_all)]
    async fn delete_all(&self, cancel: &CancellationToken) -> Result<u64, StoreError> {
        run_cancellable(cancel, async {
            let result = sqlx::query("DELETE FROM situations")
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected())
        })
        .await
    }
}
