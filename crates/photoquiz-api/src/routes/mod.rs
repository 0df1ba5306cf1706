//! Route modules, one per area of the game.

use axum::Router;

use crate::state::AppState;

pub mod game;
pub mod health;
pub mod session;
pub mod situations;

/// Every route, with the game API mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).nest(
        "/api",
        game::router()
            .merge(session::router())
            .merge(situations::router()),
    )
}
