//! hostd: host daemon configuration runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.yml ──▶ loader ──▶ ConfigStore ◀──────── readers (any number)
//!       ▲                      │    ▲
//!       │                      │    └── reload (watcher, SIGHUP)
//!   ConfigWriter ◀── update ───┤
//!   (own lock,                 ▼
//!    temp + rename)     IdentityProvisioner ──▶ useradd / adduser
//!                              │
//!                              ▼
//!                     PermissionReconciler ──▶ chown <data>/<uuid>/ (bounded fan-out)
//! ```

use std::path::PathBuf;

use clap::Parser;

use hostd::config::{load_config, DEFAULT_LOCATION};
use hostd::lifecycle::{Shutdown, Startup};
use hostd::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "hostd")]
#[command(version, about = "Host daemon configuration runtime", long_about = None)]
struct Cli {
    /// Path to the configuration document.
    #[arg(short, long, default_value = DEFAULT_LOCATION)]
    config: PathBuf,

    /// Run in debug mode for this process without persisting it.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    let level = logging::effective_level(&config.observability.log_level, cli.debug || config.debug);
    logging::init(level, config.observability.json_logs);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        debug_forced = cli.debug,
        "hostd starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let daemon = Startup::new(cli.config, cli.debug).boot(config).await?;
    daemon.serve(Shutdown::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
