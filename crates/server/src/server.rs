//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with the analyze and infrastructure endpoints
//! - Middleware stack (logging, timeout, compression, panic containment)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{analyze, api_info, health};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{any, get};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Static infrastructure routes (`/`, `/health`, `/ready`, `/metrics`)
/// take precedence over the single-segment `/{name}` analyze capture;
/// everything else falls through to the minimal-report fallback.
///
/// Middleware stack (applied in reverse order):
/// 1. Request ID tracking
/// 2. Request logging and metrics
/// 3. Timeout handling
/// 4. Compression
/// 5. CORS
/// 6. Panic containment (minimal report, never an unhandled fault)
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let infra_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    // The original service ran its handler for every method, so the
    // analyze capture accepts any; non-POST traffic fails the content
    // checks and gets the minimal report.
    let analyze_routes = Router::new()
        .route("/{name}", any(analyze::analyze_upload))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes as usize,
        ));

    Router::new()
        .merge(infra_routes)
        .merge(analyze_routes)
        .fallback(analyze::invalid_report)
        .layer(CatchPanicLayer::custom(analyze::report_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the retouch HTTP server
///
/// Initializes logging and metrics, builds the router, binds the TCP
/// listener, and serves until SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .json()
        .init();

    // Install the metrics recorder before any request is served
    let metrics_handle = if config.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    // Create server state
    let state = Arc::new(ServerState::new(config.clone(), metrics_handle));

    // Build router
    let app = build_router(state);

    // Parse bind address
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!("Starting retouch server on {}", addr);
    tracing::info!(
        "Timeout: {}s, Max upload: {} bytes, accepted content type: {}",
        config.timeout_secs,
        config.max_upload_bytes,
        config.accepted_content_type
    );
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
