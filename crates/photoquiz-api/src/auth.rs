//! Admin-only route guard.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that only succeeds when the request carries the configured
/// admin token. Handlers take it as an argument to become privileged.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        match (state.admin_token.as_deref(), presented) {
            (Some(expected), Some(presented)) if expected == presented => Ok(Self),
            _ => {
                warn!(path = %parts.uri.path(), "privileged route refused");
                Err(ApiError::Forbidden)
            }
        }
    }
}
