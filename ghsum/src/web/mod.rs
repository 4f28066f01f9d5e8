//! Web server for generated reports
//!
//! Serves the output directory (markdown, JSON and the RSS feed) as static
//! files next to a health check, and runs the scheduler in the background
//! for the server's lifetime.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::scheduler::Scheduler;

/// Configuration for the web server
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone)]
struct ServiceInfo {
    repositories: usize,
    feed: Option<String>,
}

/// Start the server and the background scheduler; returns on Ctrl+C
pub async fn serve(web: WebConfig, config: &Config) -> Result<()> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let scheduler = Scheduler::new(&web.config_path, config)?;
    let scheduler_task = tokio::spawn(scheduler.run());

    let app = create_router(config);
    let addr: SocketAddr = format!("{}:{}", web.host, web.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", web.host, web.port))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving {} on http://{}", config.output_dir.display(), addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler_task.abort();
    info!("Server stopped");
    served?;
    Ok(())
}

/// Router with the API routes and the output directory as fallback
pub fn create_router(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let info = Arc::new(ServiceInfo {
        repositories: config.repositories.len(),
        feed: config.rss.as_ref().map(|rss| format!("/{}", rss.filename)),
    });

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .with_state(info)
        .fallback_service(ServeDir::new(&config.output_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "ghsum" }))
}

async fn index(State(info): State<Arc<ServiceInfo>>) -> Json<Value> {
    Json(json!({
        "service": "ghsum",
        "version": env!("CARGO_PKG_VERSION"),
        "repositories": info.repositories,
        "feed": info.feed,
        "endpoints": ["/healthz"],
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
