//! Routes that drive the round: start, reveal photos, show the answer,
//! move on.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use photoquiz_core::situation::{Photo, SituationStats};
use photoquiz_round::{PhotoProgress, RoundError};
use photoquiz_session::{Player, PlayerScore, PublishOutcome};
use serde::Serialize;
use tracing::{info, instrument};

use crate::auth::Admin;
use crate::error::ApiError;
use crate::state::AppState;

/// URL under which the file-retrieval service serves a photo.
#[must_use]
pub fn photo_url(file_id: &str) -> String {
    format!("/api/photo/{file_id}")
}

/// The photo on screen and where it sits in the round.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    /// Where to fetch the image.
    pub photo_url: String,
    /// 1-based position of this photo.
    pub current_photo: usize,
    /// Photos in the round.
    pub total_photos: usize,
    /// Whether another photo can be revealed.
    pub has_more: bool,
}

impl PhotoView {
    fn new(photo: &Photo, progress: PhotoProgress) -> Self {
        Self {
            photo_url: photo_url(&photo.file_id),
            current_photo: progress.current,
            total_photos: progress.total,
            has_more: progress.has_more(),
        }
    }
}

/// Response body for the photo-revealing routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    /// Current photo.
    #[serde(flatten)]
    pub photo: PhotoView,
    /// Always `false` here.
    pub game_over: bool,
    /// Whose turn it is, when a session exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<Player>,
    /// Standings, when a session exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoreboard: Option<Vec<PlayerScore>>,
}

/// Response body for POST /answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// The round's answer text.
    pub answer: String,
    /// The player whose turn just ended, when a session exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player: Option<Player>,
    /// Whether the turn-end notification was queued.
    pub turn_notified: bool,
}

/// Body returned by POST /next-round once every situation has been played.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverResponse {
    /// Always `true`.
    pub game_over: bool,
    /// Final standings, empty without a session.
    pub scoreboard: Vec<PlayerScore>,
}

/// Either the next round's first photo or the end of the game.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NextRoundResponse {
    /// A new round started.
    Round(RoundResponse),
    /// The pool is exhausted.
    GameOver(GameOverResponse),
}

/// Response body for POST /reset.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Pool counters after the reset.
    pub stats: SituationStats,
}

async fn round_response(state: &AppState, photo: &Photo) -> Result<RoundResponse, ApiError> {
    let progress = state.round_engine.get_current_photo_info().await?;
    Ok(RoundResponse {
        photo: PhotoView::new(photo, progress),
        game_over: false,
        current_player: state.sessions.get_current_player(),
        scoreboard: state.sessions.get_scoreboard(),
    })
}

/// POST /start
#[instrument(skip_all)]
async fn start(State(state): State<AppState>) -> Result<Json<RoundResponse>, ApiError> {
    let cancel = state.request_token();
    let photo = state.round_engine.start_new_round(&cancel).await?;
    Ok(Json(round_response(&state, &photo).await?))
}

/// POST /next-photo
#[instrument(skip_all)]
async fn next_photo(State(state): State<AppState>) -> Result<Json<RoundResponse>, ApiError> {
    let photo = state.round_engine.next_photo().await?;
    Ok(Json(round_response(&state, &photo).await?))
}

/// POST /answer
#[instrument(skip_all)]
async fn answer(State(state): State<AppState>) -> Result<Json<AnswerResponse>, ApiError> {
    let answer = state.round_engine.get_answer().await?;
    let outcome = state.sessions.notify_turn_end();

    Ok(Json(AnswerResponse {
        answer,
        current_player: state.sessions.get_current_player(),
        turn_notified: outcome == Some(PublishOutcome::Delivered),
    }))
}

/// POST /next-round
#[instrument(skip_all)]
async fn next_round(State(state): State<AppState>) -> Result<Json<NextRoundResponse>, ApiError> {
    let cancel = state.request_token();

    match state.round_engine.finish_round(&cancel).await {
        Ok(()) | Err(RoundError::NotStarted) => {}
        Err(err) => return Err(err.into()),
    }

    match state.round_engine.start_new_round(&cancel).await {
        Ok(photo) => {
            state.sessions.next_player();
            Ok(Json(NextRoundResponse::Round(
                round_response(&state, &photo).await?,
            )))
        }
        Err(RoundError::NoSituationsAvailable) => {
            info!("every situation has been played");
            let scoreboard = state.sessions.finish_game().unwrap_or_default();
            Ok(Json(NextRoundResponse::GameOver(GameOverResponse {
                game_over: true,
                scoreboard,
            })))
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /stats
#[instrument(skip_all)]
async fn stats(State(state): State<AppState>) -> Result<Json<SituationStats>, ApiError> {
    let cancel = state.request_token();
    Ok(Json(state.round_engine.get_stats(&cancel).await?))
}

/// POST /reset
#[instrument(skip_all)]
async fn reset(
    _admin: Admin,
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ApiError> {
    let cancel = state.request_token();
    state.round_engine.reset_game(&cancel).await?;
    let stats = state.round_engine.get_stats(&cancel).await?;
    info!(total = stats.total, "game reset");
    Ok(Json(ResetResponse { stats }))
}

/// Returns the router for round play.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/next-photo", post(next_photo))
        .route("/answer", post(answer))
        .route("/next-round", post(next_round))
        .route("/stats", get(stats))
        .route("/reset", post(reset))
}
