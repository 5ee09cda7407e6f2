use crate::adapters::database::DbPool;
use crate::adapters::database::masking::mask_secret;
use crate::config::HealthConfig;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("fugue-server");
        Self {
            status: meter
                .i64_gauge("fugue_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub const SCHEMA_PENDING: &str = "Database reachable but schema migrations are pending";

#[derive(Clone, Debug)]
pub struct HealthService {
    pool: DbPool,
    config: HealthConfig,
    schema_ready: watch::Receiver<bool>,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(pool: DbPool, config: HealthConfig, schema_ready: watch::Receiver<bool>) -> Self {
        Self { pool, config, schema_ready, metrics: Metrics::new() }
    }

    /// Runs a single connectivity query. Never retries.
    ///
    /// A reachable database whose migrations have not been applied yet is reported as not ready.
    ///
    /// # Errors
    /// Returns a description of the failure, with any embedded credentials masked.
    pub async fn check_db(&self) -> Result<(), String> {
        let db_timeout = Duration::from_millis(self.config.db_timeout_ms);

        let result = match timeout(db_timeout, sqlx::query("SELECT 1").execute(&self.pool)).await {
            Ok(Ok(_)) if !*self.schema_ready.borrow() => Err(SCHEMA_PENDING.to_string()),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(describe(&e)),
            Err(_) => Err("Database connection timed out".to_string()),
        };

        let status = i64::from(result.is_ok());
        self.metrics.status.record(status, &[KeyValue::new("component", "database")]);
        result
    }
}

fn describe(error: &sqlx::Error) -> String {
    let message = error.to_string();
    if message.contains("://") || message.to_ascii_lowercase().contains("password=") {
        return format!("Database connection failed: {}", mask_secret(&message));
    }
    format!("Database connection failed: {message}")
}
