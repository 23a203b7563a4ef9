//! Live voice session management
//!
//! This module provides the `LiveBridge` abstraction that manages:
//! - Microphone capture and outbound PCM chunk encoding
//! - The duplex session with the speech model
//! - Inbound audio decoding and gapless playback scheduling
//! - Session state, status line and statistics

mod bridge;
mod config;
mod status;

pub use bridge::{BridgeError, LiveBridge};
pub use config::LiveConfig;
pub use status::{BridgeState, BridgeStats, LEVEL_BARS};
