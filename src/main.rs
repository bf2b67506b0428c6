// src/main.rs
mod cart;
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod lifecycle;
mod middleware;
mod models;
mod pagination;
mod pricing;
mod routes;
mod snapshot;
mod state;
mod storage;
mod sync;
mod tentative;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::fmt::init as tracing_init;

use crate::config::Config;
use crate::upstream::{http::HttpUpstream, memory::MemoryUpstream, Upstream};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();
    let config = Config::from_env();

    let db_pool = match database::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, url = %config.database_url, "Failed to open local storage");
            return;
        }
    };

    let upstream: Arc<dyn Upstream> = match &config.upstream_url {
        Some(url) => match HttpUpstream::new(url, config.upstream_timeout) {
            Ok(client) => {
                tracing::info!(%url, "Using order backend");
                Arc::new(client)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build upstream client");
                return;
            }
        },
        None => {
            tracing::warn!("UPSTREAM_URL not set, running against the in-memory backend");
            match &config.catalog_file {
                Some(path) => match MemoryUpstream::from_catalog_file(path).await {
                    Ok(memory) => {
                        tracing::info!(path = %path.display(), "Loaded offline catalog");
                        Arc::new(memory)
                    }
                    Err(e) => {
                        let path = path.display();
                        tracing::error!(error = %e, %path, "Failed to load catalog");
                        return;
                    }
                },
                None => Arc::new(MemoryUpstream::new()),
            }
        }
    };

    let app_state = match state::AppState::new(db_pool, upstream).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise application state");
            return;
        }
    };

    sync::refresh_all(&app_state).await;
    if let Some(period) = config.refresh_interval {
        tracing::info!(seconds = period.as_secs(), "Starting background refresh");
        sync::start_refresh_worker(app_state.clone(), period);
    }

    // Build application under the /giftbox base path
    let api = routes::create_router(app_state.clone())
        .route("/", get(|| async { "Gift Box Console API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest(routes::BASE_PATH, api)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let (host, base_port) = (config.host, config.port);
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
