use feed_check::{
    AppState, app,
    config::Config,
    freshness::SystemClock,
    store::FirestoreStore,
};
use std::{process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match FirestoreStore::from_config(&config.store) {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot set up document store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(&config, Arc::new(store), Arc::new(SystemClock));
    let app = app(state);

    // Start server
    let addr = config.listen_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server running on http://{}", addr);
    info!("Watching document {}", config.target);
    info!("API Endpoints:");
    info!("  GET    /health           - Health check");
    info!("  POST   /check            - Feed freshness (basic auth)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
