#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod platform;
pub mod services;
pub mod telemetry;

use crate::adapters::database::masking::mask_secret;
use crate::adapters::database::user_repo::UserRepository;
use crate::adapters::database::{self, DbPool};
use crate::api::ServiceContainer;
use crate::config::{Config, DatabaseConfig, StartupConfig};
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// How the database looked when the process started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    Connected,
    /// Unreachable at startup; the pool connects lazily and migrations are left to `spawn_migrator`.
    Degraded,
}

/// Resolves the connection string and connects with the startup retry policy.
///
/// When the database stays unreachable, startup fails if `require_database` is set; otherwise a lazily
/// connecting pool is returned so the process can serve in a degraded state.
///
/// # Errors
/// Returns an error if the settings are incomplete, the URL is invalid, or the database is required and
/// cannot be reached.
pub async fn connect_database(
    db_config: &DatabaseConfig,
    startup: &StartupConfig,
) -> anyhow::Result<(DbPool, DatabaseState)> {
    let url = db_config.connection_string()?;
    tracing::info!(db = %mask_secret(&url), "Connecting to database");

    match database::connect_with_retry(db_config, &url, startup.retry_policy(), startup.connect_timeout()).await {
        Ok(pool) => Ok((pool, DatabaseState::Connected)),
        Err(e) if startup.require_database => {
            Err(anyhow::anyhow!("database unreachable at {}: {e}", mask_secret(&url)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable, continuing in degraded mode");
            Ok((database::init_lazy_pool(db_config, &url)?, DatabaseState::Degraded))
        }
    }
}

/// Applies pending schema migrations.
///
/// # Errors
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Applies migrations in the background until they succeed, then flips `schema_ready`.
///
/// Used when startup continued without a database: the schema is created as soon as the database becomes
/// reachable. Stops early on shutdown.
pub fn spawn_migrator(
    pool: DbPool,
    retry_interval: Duration,
    schema_ready: watch::Sender<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            loop {
                let result = tokio::select! {
                    result = run_migrations(&pool) => result,
                    _ = shutdown_rx.wait_for(|&s| s) => return,
                };

                match result {
                    Ok(()) => {
                        schema_ready.send_replace(true);
                        tracing::info!("Database schema is ready");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, retry_in_secs = retry_interval.as_secs(), "Migrations pending");
                    }
                }

                tokio::select! {
                    () = tokio::time::sleep(retry_interval) => {}
                    _ = shutdown_rx.wait_for(|&s| s) => return,
                }
            }
        }
        .instrument(tracing::info_span!("migrator")),
    )
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
    schema_ready: Option<watch::Receiver<bool>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None, schema_ready: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Readiness stays false until this flips. Without it the schema is assumed to be migrated.
    #[must_use]
    pub fn with_schema_ready(mut self, schema_ready: watch::Receiver<bool>) -> Self {
        self.schema_ready = Some(schema_ready);
        self
    }

    /// Wires services together.
    ///
    /// # Errors
    /// Returns an error if no database pool was provided.
    pub fn build(self) -> anyhow::Result<App> {
        let pool = self.pool.ok_or_else(|| anyhow::anyhow!("database pool is required"))?;

        let auth_service = AuthService::new(self.config.auth.clone());
        let account_service = AccountService::new(pool.clone(), UserRepository::new(), auth_service.clone());
        let schema_ready = self.schema_ready.unwrap_or_else(|| watch::channel(true).1);
        let health_service = HealthService::new(pool, self.config.health.clone(), schema_ready);

        Ok(App { services: ServiceContainer { account_service, auth_service }, health_service })
    }
}

/// Routes panics through `tracing` so they reach the structured log.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Process panicked");
    }));
}

/// Flips `shutdown_tx` on Ctrl-C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
