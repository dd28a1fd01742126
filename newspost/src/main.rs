/*
newspost - main.rs
This binary loads configuration and credentials, then starts the Rocket HTTP server.
*/

use anyhow::Result;
use clap::Parser;
use common::{Config, Credentials, KeyFile};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newspost::server::{launch_rocket, AppState};

#[derive(Parser, Debug)]
#[command(name = "newspost", about = "News-grounded article generator (HTTP API + Telegram relay)")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// KEY=VALUE credentials file, consulted after the environment
    #[arg(long, value_name = "FILE", default_value = "config.txt")]
    keys: PathBuf,

    /// Do not mount the Telegram webhook even if enabled in config
    #[arg(long)]
    no_telegram: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Some(path) = common::load_dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");
    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let mut config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    if args.no_telegram {
        config.telegram.enabled = false;
    }
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let keys = KeyFile::load(&args.keys).await?;
    if !keys.is_empty() {
        info!(path = ?args.keys, count = keys.len(), "key file loaded");
    }

    let credentials = match Credentials::resolve(&config, &keys) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "missing configuration, refusing to start");
            return Err(e.into());
        }
    };

    let state = AppState::from_config(&config, &credentials)?;

    launch_rocket(state, &config).await?;

    info!("Shutdown complete");
    Ok(())
}
