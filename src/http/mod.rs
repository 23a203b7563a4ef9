//! HTTP API server for external control (the portal frontend)
//!
//! This module provides a REST API for driving the live voice bridge:
//! - POST /live/start - Start the live session
//! - POST /live/stop - Stop the live session
//! - GET /live/status - Query session status and levels
//! - POST /speech/say - Synthesize and play a text snippet
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
