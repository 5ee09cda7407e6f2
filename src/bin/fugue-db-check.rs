#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![deny(unused_must_use)]

//! Connectivity diagnostics for the configured database.
//!
//! Reports the hosting platform and the masked connection target, probes raw TCP reachability, then
//! connects through the startup retry policy and asks the server for its version.

use anyhow::Context;
use clap::Parser;
use fugue_server::adapters::database::{self, connection_string::connect_options, masking::mask_secret};
use fugue_server::config::{DatabaseConfig, StartupConfig, TelemetryConfig};
use fugue_server::{platform, telemetry};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Parser)]
#[command(name = "fugue-db-check", version, about = "Checks that the configured database is reachable")]
struct Cli {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    startup: StartupConfig,

    #[command(flatten)]
    telemetry: TelemetryConfig,

    /// Timeout for the raw TCP reachability probe
    #[arg(long, env = "FUGUE_TCP_PROBE_TIMEOUT_MS", default_value_t = 5000)]
    tcp_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry_guard = telemetry::init_telemetry(&cli.telemetry)?;

    let result = run(&cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Database check failed");
    }

    telemetry_guard.shutdown();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    tracing::info!(platform = %platform::detect(), "Detected hosting platform");

    let url = cli.database.connection_string()?;
    let masked = mask_secret(&url);
    tracing::info!(db = %masked, "Checking database");

    let target = connect_options(&url).with_context(|| format!("invalid connection string {masked}"))?;
    probe_tcp(target.options.get_host(), target.options.get_port(), Duration::from_millis(cli.tcp_timeout_ms)).await?;

    let policy = cli.startup.retry_policy();
    let pool = database::connect_with_retry(&cli.database, &url, policy, cli.startup.connect_timeout())
        .await
        .map_err(|e| anyhow::anyhow!("could not connect to {masked}: {e}"))?;

    let version: String = sqlx::query_scalar("SELECT version()").fetch_one(&pool).await?;
    tracing::info!(version = %version, "Database reachable");

    pool.close().await;
    Ok(())
}

async fn probe_tcp(host: &str, port: u16, limit: Duration) -> anyhow::Result<()> {
    match timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => {
            tracing::info!(host, port, "TCP connection succeeded");
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::anyhow!("TCP connection to {host}:{port} failed: {e}")),
        Err(_) => Err(anyhow::anyhow!("TCP connection to {host}:{port} timed out after {}ms", limit.as_millis())),
    }
}
