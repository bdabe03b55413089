//! SubBoard API Server
//!
//! Serves subscription feeds for a fixed catalog of boards (subscription panels).
//! Each board validates its query parameters against a declared schema, then logs
//! into the upstream panel and returns the subscription it hands out.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{platform_client_config, NameserverResolver, XBoardPanelClient};
use app::BoardRegistry;
use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BoardRegistry>,
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_boards))
        .route("/board/:id", get(handlers::get_board))
        .fallback(handlers::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,subboard_api=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env)
    let config = Config::from_env();
    init_tracing(config.json_logs);

    tracing::info!("Starting SubBoard API...");

    // Create adapters sharing one connection pool
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let panel = Arc::new(XBoardPanelClient::new(
        http.clone(),
        config.api_timeout,
        config.fetch_timeout,
    ));
    let tls = Arc::new(platform_client_config()?);
    let resolver = Arc::new(NameserverResolver::new(http, tls, config.dns_timeout));

    let registry = Arc::new(BoardRegistry::standard(panel, resolver));
    tracing::info!(boards = ?registry.ids(), "board registry ready");

    let app = router(AppState { registry });

    // Start server
    let addr = config
        .socket_addr()
        .with_context(|| format!("invalid HOST {:?}", config.host))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
