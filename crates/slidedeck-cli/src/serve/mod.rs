//! Local web server: the browser UI and the JSON API behind it.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)
//! - `error` - error type rendered as `{"error": message}`
//! - `templates` - HTML/CSS/JS page rendering

mod error;
mod handlers;
mod models;
mod templates;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use color_eyre::eyre::WrapErr;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use slidedeck_core::{Config, DeckManager, FileStorage, TemplateAnalysis, TemplateRegistry};

use error::ApiError;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    pub config: Config,
    pub registry: TemplateRegistry,
    /// Plan and report records.
    pub manager: DeckManager<FileStorage>,
    /// Analyses by template name, filled on first use.
    pub analyses: RwLock<HashMap<String, Arc<TemplateAnalysis>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = TemplateRegistry::new(config.templates.clone());
        let manager = DeckManager::new(FileStorage::with_config(config.storage.clone()));
        Self {
            config,
            registry,
            manager,
            analyses: RwLock::new(HashMap::new()),
        }
    }

    /// Analysis of a registered template, cached per name.
    pub async fn analysis_for(&self, name: &str) -> Result<Arc<TemplateAnalysis>, ApiError> {
        if let Some(analysis) = self.analyses.read().await.get(name) {
            return Ok(analysis.clone());
        }
        let template = self.registry.load(name)?;
        let analysis = Arc::new(TemplateAnalysis::analyze(&template));
        info!(template = name, layouts = analysis.len(), "template analyzed");
        self.analyses
            .write()
            .await
            .insert(name.to_string(), analysis.clone());
        Ok(analysis)
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Where the server listens.
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Whether to open the browser automatically.
    pub open_browser: bool,
}

// =============================================================================
// Server Entry Point
// =============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/plan", post(handlers::api_plan))
        .route("/api/execute", post(handlers::api_execute))
        .route("/api/download/{id}", get(handlers::api_download))
        .route("/api/templates", get(handlers::api_templates))
        .route("/api/chat", post(handlers::api_chat))
        .route("/api/preview/{id}", get(handlers::api_preview))
        .route("/api/health", get(handlers::api_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

/// Starts the server and runs until interrupted.
pub async fn start_server(config: Config, serve: ServeConfig) -> color_eyre::Result<()> {
    let addr: SocketAddr = format!("{}:{}", serve.host, serve.port)
        .parse()
        .wrap_err_with(|| format!("invalid listen address {}:{}", serve.host, serve.port))?;
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let url = format!("http://{}:{}", serve.host, serve.port);
    println!("Starting SlideDeck server...");
    println!("UI: {url}");
    println!("Press Ctrl+C to stop\n");

    if serve.open_browser {
        if let Err(e) = open::that(&url) {
            eprintln!("Could not open browser: {e}");
        }
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
