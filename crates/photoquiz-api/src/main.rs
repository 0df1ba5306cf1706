//! Photo quiz API server entry point.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use photoquiz_api::config::Config;
use photoquiz_api::error::AppError;
use photoquiz_api::state::AppState;
use photoquiz_api::{routes, telemetry, turn_watcher};
use photoquiz_core::clock::SystemClock;
use photoquiz_core::rng::OsSeededRng;
use photoquiz_session::{SessionManager, TURN_END_CHANNEL_CAPACITY, turn_end_channel};
use photoquiz_store::{PgSituationStore, schema};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const WATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let telemetry_guard = telemetry::init(config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(err) = &result {
        tracing::error!(error = %err, "server stopped with an error");
    }

    telemetry_guard.shutdown();
    result.map_err(Into::into)
}

async fn run(config: Config) -> Result<(), AppError> {
    info!(?config, "starting photo quiz API server");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    schema::run_migrations(&pool).await?;

    let shutdown = CancellationToken::new();
    let (publisher, receiver) = turn_end_channel(TURN_END_CHANNEL_CAPACITY);
    let watcher = turn_watcher::spawn(receiver);

    let sessions = SessionManager::new(
        Arc::new(SystemClock),
        Box::new(OsSeededRng::new()),
        publisher,
    );
    let app_state = AppState::new(
        Arc::new(PgSituationStore::new(pool.clone())),
        sessions,
        config.admin_token.clone(),
        shutdown.clone(),
    );
    if app_state.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; privileged routes are disabled");
    }

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    tokio::spawn(wait_for_signal(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // The router, and with it the last publisher, is gone once serve returns.
    match tokio::time::timeout(WATCHER_DRAIN_TIMEOUT, watcher).await {
        Ok(Ok(handled)) => info!(handled, "turn watcher drained"),
        Ok(Err(err)) => warn!(error = %err, "turn watcher task failed"),
        Err(_) => warn!("turn watcher did not stop in time"),
    }

    pool.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
    shutdown.cancel();
}
