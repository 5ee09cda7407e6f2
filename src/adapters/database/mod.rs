pub mod connection_string;
pub mod masking;
pub mod records;
pub mod retry;
pub mod user_repo;

use crate::config::DatabaseConfig;
use connection_string::{ConnectTarget, connect_options};
use masking::mask_secret;
use opentelemetry::global;
use retry::{RetryError, RetryPolicy, retry};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, Pool, Postgres};
use std::io;
use std::time::Duration;
use tokio::time::timeout;

pub type DbPool = Pool<Postgres>;

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
}

/// Initializes the database connection pool with a single connection attempt.
///
/// # Errors
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn init_pool(config: &DatabaseConfig, url: &str) -> Result<DbPool, sqlx::Error> {
    let target = connect_options(url)?;
    pool_options(config).connect_with(target.options).await
}

/// Builds a pool that connects on first use. Used when serving degraded without a reachable database.
///
/// # Errors
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn init_lazy_pool(config: &DatabaseConfig, url: &str) -> Result<DbPool, sqlx::Error> {
    let target = connect_options(url)?;
    Ok(pool_options(config).connect_lazy_with(target.options))
}

/// One driver-level connect bounded by `limit`. A timeout is reported as a transient I/O error.
async fn connect_once(options: &PgConnectOptions, limit: Duration) -> Result<(), sqlx::Error> {
    let conn = timeout(limit, PgConnection::connect_with(options)).await.map_err(|_| {
        let message = format!("connect timed out after {}ms", limit.as_millis());
        sqlx::Error::Io(io::Error::new(io::ErrorKind::TimedOut, message))
    })??;
    conn.close().await
}

/// Verifies the database accepts connections, retrying transient failures according to `policy`, then
/// returns a pool over the same options.
///
/// Every attempt is a single connect bounded by the URL's `connect_timeout`, falling back to
/// `connect_timeout`. The returned pool opens its connections on demand.
///
/// # Errors
/// Returns the last driver error, tagged as exhausted or permanent. A malformed URL is permanent.
#[tracing::instrument(skip_all, fields(db = %mask_secret(url), max_attempts = policy.max_attempts()))]
pub async fn connect_with_retry(
    config: &DatabaseConfig,
    url: &str,
    policy: RetryPolicy,
    connect_timeout: Duration,
) -> Result<DbPool, RetryError<sqlx::Error>> {
    let ConnectTarget { options, connect_timeout: from_url } = connect_options(url).map_err(RetryError::Permanent)?;
    let limit = from_url.unwrap_or(connect_timeout);

    let attempts_total = global::meter("fugue-server")
        .u64_counter("db_connect_attempts_total")
        .with_description("Database connection attempts made during startup and diagnostics")
        .build();

    let result = retry(policy, || {
        attempts_total.add(1, &[]);
        connect_once(&options, limit)
    })
    .await;

    match result {
        Ok(()) => {
            tracing::info!(connect_timeout_ms = %limit.as_millis(), "Database connection established");
            Ok(pool_options(config).connect_lazy_with(options))
        }
        Err(e) => {
            tracing::error!(error = %e, exhausted = e.is_exhausted(), "Database connection failed");
            Err(e)
        }
    }
}
