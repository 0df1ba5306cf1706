//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use photoquiz_api::routes;
use photoquiz_api::state::AppState;
use photoquiz_core::rng::DeterministicRng;
use photoquiz_session::{SessionManager, TurnEndReceiver, turn_end_channel};
use photoquiz_test_support::{FixedClock, InMemorySituationStore, MockRng};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Admin token configured on every test app.
pub const ADMIN_TOKEN: &str = "integration-admin";

/// A running test application: shared state plus the turn-end receiver.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemorySituationStore>,
    pub turn_events: TurnEndReceiver,
}

impl TestApp {
    /// Build the app over `store` with players kept in entry order.
    pub fn new(store: InMemorySituationStore) -> Self {
        Self::with_rng(store, Box::new(MockRng))
    }

    /// Build the app over `store` with a custom turn-order RNG.
    pub fn with_rng(store: InMemorySituationStore, rng: Box<dyn DeterministicRng>) -> Self {
        let store = Arc::new(store);
        let (publisher, turn_events) = turn_end_channel(4);
        let sessions = SessionManager::new(Arc::new(FixedClock::reference()), rng, publisher);
        let state = AppState::new(
            store.clone(),
            sessions,
            Some(ADMIN_TOKEN.to_owned()),
            CancellationToken::new(),
        );
        Self {
            state,
            store,
            turn_events,
        }
    }

    /// The full router, built the same way `main.rs` builds it.
    pub fn router(&self) -> Router {
        routes::router().with_state(self.state.clone())
    }

    /// Send a POST request with an optional JSON body.
    pub async fn post(&self, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        self.send("POST", uri, body, None).await
    }

    /// Send a POST request carrying the admin token.
    pub async fn admin_post(
        &self,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.send("POST", uri, body, Some(ADMIN_TOKEN)).await
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send("GET", uri, None, None).await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("x-admin-token", token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self.router().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };

        (status, json)
    }
}
