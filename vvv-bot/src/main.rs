//! vvv-bot - V.V.V quiz leaderboard bot
//!
//! Serves the keep-alive page, the health check and the message ingress
//! endpoint the chat transport posts to. All state lives in JSON files under
//! the data folder.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use vvv_bot::{build_router, AppState};
use vvv_core::config::{AdminRegistry, CompiledDefaults, DataDir, DataDirResolver, TomlConfig};
use vvv_core::sessions::spawn_sweeper;
use vvv_core::{time, LeaderboardStore};

#[derive(Parser, Debug)]
#[command(name = "vvv-bot")]
#[command(about = "Quiz leaderboard bot for the V.V.V group")]
#[command(version)]
struct Args {
    /// Data folder (overrides VVV_DATA_DIR and the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// TOML bootstrap config
    #[arg(short, long, env = "VVV_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "VVV_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();
    let config_path = args.config.clone().unwrap_or(defaults.config_file);
    let config = TomlConfig::load(&config_path)?;

    // Optional second sink, plain text appended to `[logging] file`
    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vvv_bot={0},vvv_core={0},tower_http=info", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!(
        "Starting V.V.V bot (vvv-bot) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if !config_path.exists() {
        warn!("No config file at {}, running on defaults", config_path.display());
    }

    let data_dir = DataDir::new(
        DataDirResolver::new()
            .with_cli_arg(args.data_dir)
            .with_toml(&config)
            .resolve(),
    );
    data_dir
        .ensure_exists()
        .with_context(|| format!("creating data folder {}", data_dir.root().display()))?;
    info!("Data folder: {}", data_dir.root().display());

    let store = LeaderboardStore::open(&data_dir, chrono::Duration::hours(config.backup_retention_hours));
    match store.sweep_backups(time::now()) {
        Ok(removed) if !removed.is_empty() => info!("Removed {} expired backup(s)", removed.len()),
        Ok(_) => {}
        Err(e) => warn!("Backup sweep failed: {}", e),
    }
    let admins = AdminRegistry::open(config.super_admin_id.clone(), &data_dir);
    info!("Command prefix: {:?}, {} admin(s)", admins.prefix(), admins.admins().len());

    let state = AppState::new(store, admins);
    spawn_sweeper(
        state.sessions.clone(),
        std::time::Duration::from_secs(config.session_sweep_interval_secs.max(1)),
    );
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("vvv-bot listening on http://0.0.0.0:{}", port);
    info!("Health check: http://0.0.0.0:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
