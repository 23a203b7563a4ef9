use serde::{Deserialize, Serialize};

/// Configuration for the live voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Speech model opened for the duplex session
    pub model: String,

    /// Prebuilt synthetic voice for model responses
    pub voice: String,

    /// Samples per capture buffer (4096 at 16kHz is 256ms)
    pub capture_buffer_size: usize,

    /// Encoded chunks that may queue between encoder and sender before the
    /// encoder blocks
    pub outbound_queue_size: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Zephyr".to_string(),
            capture_buffer_size: 4096,
            outbound_queue_size: 32,
        }
    }
}
