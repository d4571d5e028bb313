mod backend;
mod catalog;
mod config;
mod frame;
mod routes;
mod services;
mod state;
mod views;

use std::sync::Arc;

use crate::backend::Backend;
use crate::backend::memory::MemoryBackend;
use crate::backend::rest::RestBackend;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let catalog = match catalog::Catalog::bundled() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "bundled catalog failed to load");
            std::process::exit(1);
        }
    };

    // Backend is optional: without one the portal runs on in-process tables.
    let backend: Arc<dyn Backend> = match config.backend.clone() {
        Some(backend_config) => match RestBackend::new(backend_config) {
            Ok(client) => {
                tracing::info!("hosted backend configured");
                Arc::new(client)
            }
            Err(e) => {
                tracing::error!(error = %e, "backend client init failed");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("ARCADE_BACKEND_URL not set — using in-process backend; nothing will persist");
            Arc::new(MemoryBackend::new())
        }
    };

    let game_count = catalog.games().len();
    let state = state::AppState::new(backend, catalog, config.cookie_secure);
    let app = routes::app(state, &config);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(port = config.port, games = game_count, "arcade listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
