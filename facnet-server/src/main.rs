mod api;
mod config;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use facnet::Session;
use facnet_core::read_facilities_from_path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    api::AppState,
    config::{Cli, ServerConfig},
    error::StartupError,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("facnet=info,tower_http=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = ServerConfig::load(&cli)?;
    info!(
        "Starting facnet-server v{} (default place '{}')",
        env!("CARGO_PKG_VERSION"),
        config.default_place
    );

    let session = Session::from_config(config.network.clone());
    if let Some(path) = &config.facilities {
        let store = read_facilities_from_path(path)?;
        info!("Preloaded {} facilities from {}", store.len(), path.display());
        session.replace_facilities(store);
    }

    let state = Arc::new(AppState {
        session,
        default_place: config.default_place.clone(),
    });
    let app = api::router(state, config.request_timeout(), config.max_concurrent_requests);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.bind,
            source,
        })?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
