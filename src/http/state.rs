use std::sync::Arc;

use crate::live::LiveBridge;
use crate::speech::SpeechPlayer;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single live voice bridge of this process
    pub bridge: Arc<LiveBridge>,

    /// One-shot speech synthesis playback
    pub speech: Arc<SpeechPlayer>,
}

impl AppState {
    pub fn new(bridge: Arc<LiveBridge>, speech: Arc<SpeechPlayer>) -> Self {
        Self { bridge, speech }
    }
}
