//! matsized — the matsize daemon.
//!
//! Serves the prediction API, or runs a single prediction from the
//! command line using the same service and response envelope.
//!
//! # Usage
//!
//! ```text
//! matsized serve --config matsize.toml --port 8000
//! matsized predict --pct-min 35 --cum-min 85 --offline
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use matsize_api::{ApiState, PredictResponse, build_router};
use matsize_core::MatsizeConfig;
use matsize_predict::PredictionService;

#[derive(Parser)]
#[command(name = "matsized", about = "matsize prediction daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on, overriding `server.port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one prediction and print the response envelope.
    Predict {
        /// PCT_MIN_0.25MM_60MSH measurement.
        #[arg(long, allow_negative_numbers = true)]
        pct_min: f64,

        /// CUM_MIN_3.15MM measurement.
        #[arg(long, allow_negative_numbers = true)]
        cum_min: f64,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the remote predictor and synthesize locally.
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,matsized=debug,matsize=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Command::Predict {
            pct_min,
            cum_min,
            config,
            offline,
        } => {
            let mut config = load_config(config.as_deref())?;
            if offline {
                config.prediction.remote_enabled = false;
            }
            run_predict(&config, pct_min, cum_min).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MatsizeConfig> {
    match path {
        Some(path) => {
            let config = MatsizeConfig::from_file(path)?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(MatsizeConfig::default()),
    }
}

async fn run_server(config: MatsizeConfig) -> anyhow::Result<()> {
    info!(environment = %config.server.environment, "matsize daemon starting");

    let service = PredictionService::from_config(&config)?;
    let state = ApiState::new(service, &config);
    if !state.models.all_present() {
        info!(artifacts = ?config.models.artifacts, "model artifacts not found, health will report models_loaded=false");
    }

    let router = build_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("matsize daemon stopped");
    Ok(())
}

async fn run_predict(config: &MatsizeConfig, pct_min: f64, cum_min: f64) -> anyhow::Result<()> {
    let service = PredictionService::from_config(config)?;
    let prediction = service.predict(Some(pct_min), Some(cum_min)).await?;
    println!("{}", serde_json::to_string_pretty(&PredictResponse::new(&prediction))?);
    Ok(())
}
