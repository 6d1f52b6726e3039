//! TestForge API server

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use testforge_web::{AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "testforge-web")]
#[command(about = "TestForge API server - LLM-generated test scripts, executed with Mocha or Jest")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TESTFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// Database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("TestForge API v{}", testforge_common::VERSION);

    let config_path = cli
        .config
        .unwrap_or_else(|| testforge_common::default_store_path().join("config.toml"));
    let mut config = ServerConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.apply_env();
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    if cli.write_config {
        config
            .save(&config_path)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        info!("Wrote configuration to {}", config_path.display());
        return Ok(());
    }

    let addr = config.listen_addr()?;
    let state = AppState::new(&config).context("failed to initialise TestForge (is OPENAI_API_KEY set?)")?;

    testforge_web::serve(addr, Arc::new(state)).await
}
