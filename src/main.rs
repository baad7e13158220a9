//! RDNS Migrate
//!
//! One-shot migration of RDNS wildcard records from 0.4.x to 0.5.x.
//!
//! # Usage
//! ```bash
//! sudo rdns-migrate \
//!     --dsn 'rdns:secret@tcp(127.0.0.1:3306)/rdns' \
//!     --aws_hosted_zone_id Z0123456789 \
//!     --aws_access_key_id AKID... \
//!     --aws_secret_access_key ...
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rdns_migrate::{privilege, Config, MigrationReport};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --debug
    let default_level = if config.debug { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match migrate(&config).await {
        Ok(report) => {
            info!(
                scanned = report.scanned,
                inserted = report.inserted,
                skipped = report.skipped,
                upserted = report.upserted,
                dry_run = report.dry_run,
                "Migration complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = ?e, "Migration failed");
            std::process::exit(1);
        }
    }
}

async fn migrate(config: &Config) -> Result<MigrationReport> {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "rdns-migrate".to_string());
    privilege::ensure_root(&program)?;

    info!(
        zone_id = config.aws_hosted_zone_id.as_deref().unwrap_or_default(),
        dry_run = config.dry_run,
        "Starting RDNS wildcard migration"
    );

    rdns_migrate::run(config)
        .await
        .context("wildcard migration aborted")
}
