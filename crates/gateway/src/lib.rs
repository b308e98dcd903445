//! HTTP API gateway for Veridian.
//!
//! Exposes the chat pipeline, the profile lookup, the carbon calculator,
//! and a health check.
//!
//! Built on Axum for high performance async HTTP.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use veridian_chat::{ChatOrchestrator, RateLimiter};
use veridian_config::AppConfig;
use veridian_core::store::DocumentStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub chat: Arc<ChatOrchestrator>,
    pub store: Arc<dyn DocumentStore>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(chat: Arc<ChatOrchestrator>, store: Arc<dyn DocumentStore>) -> Self {
        Self { chat, store }
    }

    /// Build the store, the generation invoker, and the chat pipeline ONCE.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = veridian_store::build_from_config(&config.store);
        let invoker = veridian_providers::build_from_config(&config.generation);
        let chat = ChatOrchestrator::from_config(config, store.clone(), invoker);
        Self::new(Arc::new(chat), store)
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS open to any origin
/// - Request body size limit (64 KB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/chat", post(handlers::chat_handler))
        .route("/chat/", post(handlers::chat_handler))
        .route("/users/{user_id}", get(handlers::user_handler))
        .route("/carbon/calculate", post(handlers::carbon_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop expired rate-limit windows.
pub fn spawn_window_sweeper(
    limiter: Arc<RateLimiter>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_idle(chrono::Utc::now());
            debug!(removed, "Rate-limit sweep finished");
        }
    })
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState::from_config(&config));

    if config.chat.sweep_interval_secs > 0 {
        spawn_window_sweeper(
            state.chat.limiter().clone(),
            Duration::from_secs(config.chat.sweep_interval_secs),
        );
    }

    info!(
        addr = %addr,
        store = state.store.name(),
        ai_configured = state.chat.invoker().is_configured(),
        max_requests = config.chat.max_requests,
        timeframe_seconds = config.chat.timeframe_seconds,
        "Gateway starting"
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
