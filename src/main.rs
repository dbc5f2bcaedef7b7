//! experiment_registry — standalone REST server for the experiment registry.
//!
//! ## Usage
//!
//! ```bash
//! experiment_registry --config config.yaml
//!
//! curl -X POST http://127.0.0.1:8000/experiments \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "exp1", "start_time": 100, "websocket_ip": "10.0.0.1",
//!        "websocket_credentials": ["u", "p"]}'
//!
//! curl http://127.0.0.1:8000/experiments
//!
//! curl -X PUT http://127.0.0.1:8000/experiments \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "exp1", "auth_hash": "<token>", "description": "running"}'
//! ```
//!
//! Config from flags or env vars:
//!   REGISTRY_CONFIG    — path to config.yaml (default: config.yaml)
//!   REGISTRY_BIND_ADDR — overrides `bind_addr` from the config file

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use experiment_registry::server::{build_router, AllowList};
use experiment_registry::{ExperimentRegistry, JsonFileStorage, RegistryConfig, SystemClock};

#[derive(Debug, Parser)]
#[command(name = "experiment_registry", about = "Experiment registry server")]
struct Args {
    /// Path to the YAML config file
    #[arg(long, env = "REGISTRY_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Listen address, overriding the config file
    #[arg(long, env = "REGISTRY_BIND_ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,experiment_registry=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config = RegistryConfig::load(&args.config)?;

    let storage = Arc::new(JsonFileStorage::new(&config.experiment_file));
    let registry = ExperimentRegistry::open(
        storage,
        Arc::new(SystemClock),
        config.registry_options(),
    )
    .with_context(|| format!("failed to open {:?}", config.experiment_file))?;

    tracing::info!(
        "Registry ready (experiment_file={:?}, auto_kill={}s, allowed={:?})",
        config.experiment_file,
        config.auto_kill_secs,
        config.allowed_addresses
    );

    let app = build_router(
        Arc::new(registry),
        AllowList::new(config.allowed_addresses.clone()),
    );

    let bind_addr = args.bind.unwrap_or(config.bind_addr);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    tracing::info!("experiment_registry listening on {bind_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
