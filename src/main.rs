use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pace_api::app::{self, AppState};
use pace_api::cli::Args;
use pace_api::config::AppConfig;
use pace_api::container::Container;
use pace_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and PACE_* reach the config
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    let config = args.apply(config);

    // Error tracking must be up before the subscriber that feeds it
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(&config.logging);

    info!("Starting PACE API in {} mode", config.environment.as_str());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let container = Arc::new(Container::new(Arc::new(config)));
    let app = app::router(AppState::new(container));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("PACE API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
