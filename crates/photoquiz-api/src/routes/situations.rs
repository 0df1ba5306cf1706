//! Admin routes for authoring quiz content.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use photoquiz_core::situation::{
    MAX_PHOTOS_PER_SITUATION, Photo, PhotoId, SituationId, SituationWithPhotos,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::Admin;
use crate::error::ApiError;
use crate::routes::game::photo_url;
use crate::state::AppState;

/// Request body for POST /situations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSituationRequest {
    /// The text revealed at the end of the round.
    pub answer: String,
    /// File references in display order. More can be attached later.
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Request body for POST /situations/{id}/photos.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPhotoRequest {
    /// File reference of the photo to append.
    pub file_id: String,
}

/// A photo as returned to the author.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEntry {
    /// Photo identifier.
    pub id: PhotoId,
    /// File reference.
    pub file_id: String,
    /// Zero-based display position.
    pub sort_order: i32,
    /// Where the image is served.
    pub photo_url: String,
}

impl From<Photo> for PhotoEntry {
    fn from(photo: Photo) -> Self {
        Self {
            photo_url: photo_url(&photo.file_id),
            id: photo.id,
            file_id: photo.file_id,
            sort_order: photo.sort_order,
        }
    }
}

/// A situation and its photos as returned to the author.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationView {
    /// Situation identifier.
    pub id: SituationId,
    /// Answer text.
    pub answer: String,
    /// Whether it has been played since the last reset.
    pub is_used: bool,
    /// When it was authored.
    pub created_at: DateTime<Utc>,
    /// Photos in display order.
    pub photos: Vec<PhotoEntry>,
}

impl From<SituationWithPhotos> for SituationView {
    fn from(value: SituationWithPhotos) -> Self {
        Self {
            id: value.situation.id,
            answer: value.situation.answer,
            is_used: value.situation.is_used,
            created_at: value.situation.created_at,
            photos: value.photos.into_iter().map(PhotoEntry::from).collect(),
        }
    }
}

/// Response body for DELETE /situations.
#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    /// Number of situations removed.
    pub deleted: u64,
}

fn required_text(value: &str, what: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{what} must not be blank")));
    }
    Ok(trimmed.to_owned())
}

/// POST /situations
#[instrument(skip_all)]
async fn create_situation(
    _admin: Admin,
    State(state): State<AppState>,
    payload: Result<Json<CreateSituationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SituationView>), ApiError> {
    let Json(request) = payload?;
    let answer = required_text(&request.answer, "answer")?;
    if request.photos.len() > MAX_PHOTOS_PER_SITUATION {
        return Err(ApiError::Validation(format!(
            "a situation holds at most {MAX_PHOTOS_PER_SITUATION} photos"
        )));
    }
    let file_ids = request
        .photos
        .iter()
        .map(|file_id| required_text(file_id, "photo file id"))
        .collect::<Result<Vec<_>, _>>()?;

    let cancel = state.request_token();
    let created = if file_ids.is_empty() {
        let id = state.store.create_situation(&answer, &cancel).await?;
        state
            .store
            .get_by_id(id, &cancel)
            .await?
            .ok_or(ApiError::SituationNotFound(id))?
    } else {
        state
            .store
            .create_with_photos(&answer, &file_ids, &cancel)
            .await?
    };

    info!(
        situation_id = created.situation.id,
        photos = created.photos.len(),
        "situation authored"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// POST /situations/{id}/photos
#[instrument(skip_all, fields(situation_id = id))]
async fn add_photo(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<SituationId>,
    payload: Result<Json<AddPhotoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PhotoEntry>), ApiError> {
    let Json(request) = payload?;
    let file_id = required_text(&request.file_id, "photo file id")?;
    let cancel = state.request_token();

    if state.store.get_by_id(id, &cancel).await?.is_none() {
        return Err(ApiError::SituationNotFound(id));
    }

    // The store refuses a photo past the limit atomically.
    let photo = state.store.add_photo(id, &file_id, &cancel).await?;
    info!(sort_order = photo.sort_order, "photo attached");
    Ok((StatusCode::CREATED, Json(photo.into())))
}

/// GET /situations/{id}
#[instrument(skip_all, fields(situation_id = id))]
async fn get_situation(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<SituationId>,
) -> Result<Json<SituationView>, ApiError> {
    let cancel = state.request_token();
    state
        .store
        .get_by_id(id, &cancel)
        .await?
        .map(|found| Json(found.into()))
        .ok_or(ApiError::SituationNotFound(id))
}

/// DELETE /situations
#[instrument(skip_all)]
async fn delete_all(
    _admin: Admin,
    State(state): State<AppState>,
) -> Result<Json<DeleteAllResponse>, ApiError> {
    let cancel = state.request_token();
    let deleted = state.store.delete_all(&cancel).await?;
    state.round_engine.reset_game(&cancel).await?;
    info!(deleted, "all situations deleted");
    Ok(Json(DeleteAllResponse { deleted }))
}

/// Returns the router for content authoring.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/situations", post(create_situation).delete(delete_all))
        .route("/situations/{id}", get(get_situation))
        .route("/situations/{id}/photos", post(add_photo))
}
