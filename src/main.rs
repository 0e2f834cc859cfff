#![forbid(unsafe_code)]

mod cli;
mod codec;
mod color;
mod config;
mod constants;
mod draft;
mod presets;
mod rotation;
mod session;
mod state;
mod storage;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use cli::Cli;
use config::AppConfig;
use constants::config::STORAGE_FILENAME;
use storage::{JsonFileStore, KeyValueStore, MemoryStore};

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

async fn start<S: KeyValueStore + Clone>(cli: Cli, config: AppConfig, store: S) -> Result<()> {
    let mut session = cli::open_session(store, &config, cli.fresh);
    cli::execute(cli.command, &mut session, &config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the subscriber exists, so its own log lines are not shown
    let mut config = AppConfig::load()?;

    // LOG_LEVEL wins over config.json
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.log_level.clone());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }
    info!(config = ?config, "Starting tabboard");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    if cli.ephemeral {
        info!("Ephemeral mode, nothing will be written to disk");
        runtime.block_on(start(cli, config, MemoryStore::new()))
    } else {
        let store = JsonFileStore::new(config.data_dir().join(STORAGE_FILENAME));
        info!(path = %store.path().display(), "Using storage file");
        runtime.block_on(start(cli, config, store))
    }
}
