use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::state::AppState;
use crate::live::{BridgeError, BridgeStats};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartLiveResponse {
    pub status: String,
    pub message: String,
    pub stats: BridgeStats,
}

#[derive(Debug, Serialize)]
pub struct StopLiveResponse {
    pub status: String,
    pub message: String,
    pub stats: BridgeStats,
}

#[derive(Debug, Deserialize)]
pub struct SayRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SayResponse {
    pub status: String,
    /// Playback start time on the device clock, in seconds
    pub starts_at: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /live/start
/// Start the live voice session
pub async fn start_live(State(state): State<AppState>) -> impl IntoResponse {
    info!("Live session start requested");

    match state.bridge.start().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StartLiveResponse {
                status: "started".to_string(),
                message: "Live session started".to_string(),
                stats: state.bridge.stats(),
            }),
        )
            .into_response(),
        Err(BridgeError::AlreadyActive) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "A live session is already active".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start live session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to start live session: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /live/stop
/// Stop the live voice session (idempotent)
pub async fn stop_live(State(state): State<AppState>) -> impl IntoResponse {
    info!("Live session stop requested");

    let stats = state.bridge.stop().await;

    (
        StatusCode::OK,
        Json(StopLiveResponse {
            status: "stopped".to_string(),
            message: "Live session stopped".to_string(),
            stats,
        }),
    )
        .into_response()
}

/// GET /live/status
/// Snapshot of the live session
pub async fn live_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.bridge.stats())).into_response()
}

/// POST /speech/say
/// Synthesize a text snippet and play it through the output device
pub async fn say(State(state): State<AppState>, Json(req): Json<SayRequest>) -> impl IntoResponse {
    match state.speech.say(&req.text).await {
        Ok(starts_at) => (
            StatusCode::OK,
            Json(SayResponse {
                status: "playing".to_string(),
                starts_at,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Speech synthesis failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Speech synthesis failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
