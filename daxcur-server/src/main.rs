use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use daxcur_core::config::LogFormat;
use daxcur_core::store::{ExampleStore, FileStore, MemoryStore};
use daxcur_core::{CurationConfig, ModelType};
use daxcur_server::{build_router, AppState};

/// DAX curation service.
#[derive(Parser, Debug)]
#[command(name = "daxcur", version, about)]
struct Cli {
    /// Config file (TOML). Defaults to ./daxcur.toml when present.
    #[arg(long, env = "DAXCUR_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Keep examples in memory only; nothing is written to disk.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = CurationConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    init_tracing(&config);

    let store: Arc<dyn ExampleStore> = if cli.ephemeral {
        tracing::warn!("ephemeral mode: examples are kept in memory only");
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::from_config(&config.storage);
        store
            .ensure_dirs()
            .await
            .context("creating data and backup directories")?;
        Arc::new(store)
    };

    let seed = config.storage.seed_on_start;
    let bind = config.server.bind.clone();
    let state = AppState::new(config, store);

    if seed {
        for model in ModelType::ALL {
            let written = state.repo.seed(model).await?;
            tracing::info!(model = %model, written, "seed check complete");
        }
    }

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        tracing::info!("shutdown requested");
        shutdown.cancel();
    });

    let graceful = state.shutdown.clone();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(addr = %bind, "daxcur listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful.cancelled_owned())
        .await?;
    Ok(())
}

fn init_tracing(config: &CurationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    match config.general.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
