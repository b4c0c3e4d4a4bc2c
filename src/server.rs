//! # Server Configuration
//!
//! Router assembly, shared state, and the serve loop.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::{self, events, health, webhooks};
use crate::ingest::WebhookIngestor;
use crate::repositories::EventStore;
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn EventStore>,
    pub ingestor: Arc<WebhookIngestor>,
}

impl AppState {
    /// Wires the ingestor to `store` using the configured webhook secret.
    pub fn new(config: AppConfig, store: Arc<dyn EventStore>) -> Self {
        let ingestor = WebhookIngestor::new(store.clone(), config.webhook_secret_or_empty());
        Self {
            config: Arc::new(config),
            store,
            ingestor: Arc::new(ingestor),
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let max_body_bytes = state.config.webhook_max_body_bytes();

    // The feed is read by pages served from other origins
    let feed_routes = Router::new()
        .route("/data", get(events::list_recent_events))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/webhook",
            post(webhooks::receive_webhook).layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route("/health", get(health::health))
        .merge(feed_routes)
        .fallback(handlers::not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
}

/// Starts the server with the given state
pub async fn run_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state
        .config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %profile, "Server listening");
    info!("Webhook endpoint: http://{addr}/webhook");
    info!("Event feed: http://{addr}/data");
    info!("Health check: http://{addr}/health");
    info!("API docs: http://{addr}/docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::webhooks::receive_webhook,
        crate::handlers::events::list_recent_events,
        crate::handlers::health::health,
    ),
    components(
        schemas(
            crate::handlers::webhooks::WebhookResponse,
            crate::handlers::events::EventResponse,
            crate::handlers::health::HealthResponse,
            crate::normalization::EventAction,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "webhooks", description = "GitHub webhook intake"),
        (name = "events", description = "Recent repository activity"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Repo Events API",
        description = "Receives GitHub push and pull request webhooks and serves the recent activity feed",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
