//! HTTP server setup and routing
//!
//! One GET route per symbolic command (matching the original wire surface the
//! status-bar and curses clients speak) plus the query routes and the SSE
//! event stream.

use std::future::Future;
use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::playback::SharedTransport;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub transport: SharedTransport,
    pub events: EventBus,
}

/// Build the application router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Playback commands
        .route("/pause_unpause", get(super::handlers::pause_unpause))
        .route("/skip", get(super::handlers::skip))
        .route("/previous", get(super::handlers::previous))
        .route("/restart", get(super::handlers::restart))
        .route("/volume_up", get(super::handlers::volume_up))
        .route("/volume_down", get(super::handlers::volume_down))
        .route("/stop", get(super::handlers::stop))
        // Query surface
        .route("/current_position", get(super::handlers::current_position))
        .route("/current_volume", get(super::handlers::current_volume))
        .route("/is_playing", get(super::handlers::is_playing))
        .route("/song_info", get(super::handlers::song_info))
        .route("/current_file", get(super::handlers::current_file))
        .route("/displayed_text", get(super::handlers::displayed_text))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local clients (status bars, widgets)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("server error: {}", e)))?;

    Ok(())
}
