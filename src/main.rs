use std::sync::Arc;

use anyhow::{Context, Result};
use supptrack::{
    config::{AppConfig, StoreBackend},
    core::SystemClock,
    gateway::RecordGateway,
    web::{AppState, build_router},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("failed to load application configuration")?;

    match &config.store_backend {
        StoreBackend::Memory => info!("store backend: memory"),
        StoreBackend::File(path) => info!(path = %path.display(), "store backend: file"),
    }
    let store = config.store_backend.open()?;
    let gateway = RecordGateway::new(store, Arc::new(SystemClock));

    info!(
        users = ?config.plan.users,
        supplements = config.plan.catalog().len(),
        "supplement plan loaded"
    );
    let app = build_router(AppState::new(gateway, config.plan.clone()));

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "supplement tracker started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("supptrack=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
