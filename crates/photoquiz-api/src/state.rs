//! Shared application state.

use std::sync::Arc;

use photoquiz_core::store::SituationStore;
use photoquiz_round::RoundEngine;
use photoquiz_session::SessionManager;
use tokio_util::sync::CancellationToken;

/// Application state shared across all request handlers.
///
/// There is one round engine and one session manager per process; every
/// clone of the state points at the same instances.
#[derive(Clone)]
pub struct AppState {
    /// The game in progress.
    pub round_engine: Arc<RoundEngine>,
    /// Players, turns and scores.
    pub sessions: Arc<SessionManager>,
    /// Situation store, used directly by the authoring routes.
    pub store: Arc<dyn SituationStore>,
    /// Expected `x-admin-token` value. `None` closes privileged routes.
    pub admin_token: Option<Arc<str>>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("round_engine", &self.round_engine)
            .field("sessions", &self.sessions)
            .field("privileged_routes", &self.admin_token.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state around `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SituationStore>,
        sessions: SessionManager,
        admin_token: Option<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            round_engine: Arc::new(RoundEngine::new(Arc::clone(&store))),
            sessions: Arc::new(sessions),
            store,
            admin_token: admin_token.map(Arc::from),
            shutdown,
        }
    }

    /// A token for one request's store calls. Fires when the server shuts
    /// down.
    #[must_use]
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
