use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of magnitude bars exposed for UI feedback
pub const LEVEL_BARS: usize = 5;

/// Observable connection state of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeState {
    Disconnected,
    Connecting,
    Connected,
}

/// Current state plus the free-text status line shown to the user
#[derive(Debug, Clone)]
pub(crate) struct StatusInner {
    pub state: BridgeState,
    pub detail: String,
}

impl Default for StatusInner {
    fn default() -> Self {
        Self {
            state: BridgeState::Disconnected,
            detail: "Disconnected".to_string(),
        }
    }
}

/// Snapshot of a live session for the control API
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStats {
    /// Connection state
    pub state: BridgeState,

    /// Human-readable status line ("Connecting...", "Error Occurred", ...)
    pub status: String,

    /// Identifier of the current session, if one is active
    pub session_id: Option<String>,

    /// When the current session started
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since the session started
    pub duration_secs: f64,

    /// Outbound audio chunks handed to the session
    pub frames_sent: usize,

    /// Inbound audio frames scheduled for playback
    pub frames_scheduled: usize,

    /// Magnitude-like visualization levels in 0..100 (liveness feedback only)
    pub levels: Vec<f32>,
}
