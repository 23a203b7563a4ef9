use thiserror::Error;
use tokio::sync::mpsc;

use super::output::PlaybackFrame;

/// Errors reported by the host audio devices
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("microphone access denied or device unavailable")]
    PermissionDenied,

    #[error("no suitable audio device found")]
    NotFound,

    #[error("unsupported device configuration: {0}")]
    Unsupported(String),

    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Configuration for microphone capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate delivered to the consumer (the session expects 16kHz)
    pub sample_rate: u32,
    /// Number of samples per delivered buffer
    pub buffer_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: super::pcm::CAPTURE_SAMPLE_RATE,
            buffer_size: 4096,
        }
    }
}

/// Microphone capture device
///
/// Delivers successive fixed-size buffers of mono float samples in
/// [-1.0, 1.0] at the configured sample rate.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive sample buffers.
    /// Fails with [`DeviceError::PermissionDenied`] if the user declines
    /// microphone access or the device is unavailable.
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, DeviceError>;

    /// Stop capturing and release the device (idempotent)
    async fn stop(&mut self) -> Result<(), DeviceError>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Speaker output device with a schedulable buffer source
///
/// The clock is monotonic non-decreasing and counts seconds of emitted audio.
pub trait OutputDevice: Send + Sync {
    /// Current position of the device clock, in seconds
    fn clock(&self) -> f64;

    /// Queue a frame to begin playing at `start_time` on the device clock
    fn schedule(&self, frame: PlaybackFrame, start_time: f64) -> Result<(), DeviceError>;
}
