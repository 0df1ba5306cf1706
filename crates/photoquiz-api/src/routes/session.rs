//! Routes for the multiplayer session: roster, turns and scores.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use photoquiz_session::{GameSession, Player, PlayerScore, Score};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::Admin;
use crate::error::ApiError;
use crate::state::AppState;

const MAX_PLAYERS: usize = 10;
const MAX_NAME_CHARS: usize = 20;

/// Request body for POST /session/create.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Display names, in entry order.
    pub players: Vec<String>,
}

/// Request body for POST /session/score.
#[derive(Debug, Deserialize)]
pub struct AddScoreRequest {
    /// Points to award, 0 to 3 in half-point steps.
    pub score: Score,
}

/// Response body for GET /scoreboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardResponse {
    /// Whether a session is being played.
    pub active: bool,
    /// Turn counter, 0 without a session.
    pub current_round: u32,
    /// Standings, highest first.
    pub scoreboard: Vec<PlayerScore>,
}

/// Response body for POST /session/finish.
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    /// Final standings.
    pub scoreboard: Vec<PlayerScore>,
}

/// Trims each name and enforces the roster limits.
fn validate_player_names(raw: Vec<String>) -> Result<Vec<String>, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::Validation("at least one player is required".into()));
    }
    if raw.len() > MAX_PLAYERS {
        return Err(ApiError::Validation(format!(
            "at most {MAX_PLAYERS} players are allowed"
        )));
    }

    raw.into_iter()
        .map(|name| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                Err(ApiError::Validation("player names must not be blank".into()))
            } else if trimmed.chars().count() > MAX_NAME_CHARS {
                Err(ApiError::Validation(format!(
                    "player name '{trimmed}' is longer than {MAX_NAME_CHARS} characters"
                )))
            } else {
                Ok(trimmed.to_owned())
            }
        })
        .collect()
}

/// POST /session/create
#[instrument(skip_all)]
async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<GameSession>, ApiError> {
    let Json(request) = payload?;
    let names = validate_player_names(request.players)?;

    let session = state
        .sessions
        .create_session(&names)
        .ok_or_else(|| ApiError::Validation("at least one player is required".into()))?;
    Ok(Json(session))
}

/// GET /session
#[instrument(skip_all)]
async fn get_session(State(state): State<AppState>) -> Result<Json<GameSession>, ApiError> {
    state
        .sessions
        .get_session()
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// GET /session/current-player
#[instrument(skip_all)]
async fn current_player(State(state): State<AppState>) -> Result<Json<Player>, ApiError> {
    state
        .sessions
        .get_current_player()
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// POST /session/next-player
#[instrument(skip_all)]
async fn next_player(State(state): State<AppState>) -> Result<Json<Player>, ApiError> {
    state
        .sessions
        .next_player()
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// POST /session/score
#[instrument(skip_all)]
async fn add_score(
    _admin: Admin,
    State(state): State<AppState>,
    payload: Result<Json<AddScoreRequest>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(request) = payload?;
    if !request.score.is_allowed_increment() {
        return Err(ApiError::Validation(format!(
            "score {} is outside the allowed range 0 to 3",
            request.score
        )));
    }

    state
        .sessions
        .add_score_to_current_player(request.score)
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// GET /scoreboard
#[instrument(skip_all)]
async fn scoreboard(State(state): State<AppState>) -> Json<ScoreboardResponse> {
    let response = match state.sessions.get_session() {
        Some(session) => ScoreboardResponse {
            active: session.is_active,
            current_round: session.current_round,
            scoreboard: session.scoreboard(),
        },
        None => ScoreboardResponse {
            active: false,
            current_round: 0,
            scoreboard: Vec::new(),
        },
    };
    Json(response)
}

/// POST /session/finish
#[instrument(skip_all)]
async fn finish(State(state): State<AppState>) -> Result<Json<FinishResponse>, ApiError> {
    let scoreboard = state
        .sessions
        .finish_game()
        .ok_or(ApiError::SessionNotFound)?;
    Ok(Json(FinishResponse { scoreboard }))
}

/// POST /session/reset
#[instrument(skip_all)]
async fn reset_session(_admin: Admin, State(state): State<AppState>) -> StatusCode {
    state.sessions.reset_session();
    info!("session reset by admin");
    StatusCode::NO_CONTENT
}

/// Returns the router for session management.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/create", post(create_session))
        .route("/session/current-player", get(current_player))
        .route("/session/next-player", post(next_player))
        .route("/session/score", post(add_score))
        .route("/session/finish", post(finish))
        .route("/session/reset", post(reset_session))
        .route("/scoreboard", get(scoreboard))
}
