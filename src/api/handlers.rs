//! HTTP request handlers
//!
//! Command handlers funnel into the shared dispatch; recoverable playback
//! conditions never surface here as errors. An exhausted track list is
//! reported as the session being over, with a clean status code, because it
//! is the normal end of a shuffle rather than a failure.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::server::AppContext;
use crate::commands::{self, Command};
use crate::error::Error;
use crate::playback::transport::TextPosition;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    position_ms: i64,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    volume: f32,
}

#[derive(Debug, Serialize)]
pub struct PlayingResponse {
    playing: bool,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayedTextParams {
    max_columns: u16,
    max_lines: u16,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "shufflebox".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Command Endpoints
// ============================================================================

async fn run_command(ctx: &AppContext, command: Command) -> Json<StatusResponse> {
    let mut transport = ctx.transport.lock().await;
    let status = match commands::apply(&mut transport, command) {
        Ok(()) => "ok".to_string(),
        Err(Error::Exhausted) => "session over".to_string(),
        Err(e) => {
            debug!("command {} reported: {}", command.name(), e);
            "ok".to_string()
        }
    };
    Json(StatusResponse { status })
}

/// GET /pause_unpause
pub async fn pause_unpause(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::PauseUnpause).await
}

/// GET /skip
pub async fn skip(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::Skip).await
}

/// GET /previous
pub async fn previous(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::Previous).await
}

/// GET /restart
pub async fn restart(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::Restart).await
}

/// GET /volume_up
pub async fn volume_up(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::VolumeUp).await
}

/// GET /volume_down
pub async fn volume_down(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::VolumeDown).await
}

/// GET /stop
pub async fn stop(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    run_command(&ctx, Command::Stop).await
}

// ============================================================================
// Query Endpoints
// ============================================================================

/// GET /current_position - elapsed ms, or -1 when nothing is playing
pub async fn current_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    let mut transport = ctx.transport.lock().await;
    Json(PositionResponse {
        position_ms: transport.current_position(),
    })
}

/// GET /current_volume
pub async fn current_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    let transport = ctx.transport.lock().await;
    Json(VolumeResponse {
        volume: transport.current_volume(),
    })
}

/// GET /is_playing - 200 when playing, 204 when not (status-bar clients key
/// off the status code alone)
pub async fn is_playing(State(ctx): State<AppContext>) -> Response {
    let transport = ctx.transport.lock().await;
    if transport.is_playing() {
        Json(PlayingResponse { playing: true }).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// GET /song_info - plain text display string for the current track
pub async fn song_info(State(ctx): State<AppContext>) -> String {
    let transport = ctx.transport.lock().await;
    transport.song_info()
}

/// GET /current_file
pub async fn current_file(State(ctx): State<AppContext>) -> Json<FileResponse> {
    let transport = ctx.transport.lock().await;
    Json(FileResponse {
        file: transport
            .current_file()
            .map(|p| p.display().to_string()),
    })
}

/// GET /displayed_text?max_columns=..&max_lines=.. - the text to display and
/// where to display it, for a rendering front end
pub async fn displayed_text(
    State(ctx): State<AppContext>,
    Query(params): Query<DisplayedTextParams>,
) -> Json<HashMap<String, TextPosition>> {
    let mut transport = ctx.transport.lock().await;
    Json(transport.displayed_text(params.max_columns, params.max_lines))
}
