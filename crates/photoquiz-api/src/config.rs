//! Server configuration read from environment variables.

use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Runtime settings for the API server.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound on pooled database connections.
    pub db_max_connections: u32,
    /// Token expected in `x-admin-token` for privileged routes. Privileged
    /// routes are closed when unset.
    pub admin_token: Option<String>,
    /// OTLP collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_max_connections", &self.db_max_connections)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let host = non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("DB_MAX_CONNECTIONS must be a positive integer: {e}"))
            })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };
        if db_max_connections == 0 {
            return Err(AppError::Config(
                "DB_MAX_CONNECTIONS must be a positive integer".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            admin_token: non_empty("ADMIN_TOKEN"),
            otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a valid address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
