pub mod audio;
pub mod config;
pub mod http;
pub mod inference;
pub mod live;
pub mod speech;

pub use audio::{
    AudioOutputChannel, CaptureConfig, CaptureDevice, CpalCaptureDevice, CpalOutputDevice,
    DeviceError, EncodedChunk, OutputDevice, PlaybackFrame,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use inference::{GeminiLive, SessionService};
pub use live::{BridgeError, BridgeState, BridgeStats, LiveBridge, LiveConfig};
pub use speech::{GeminiSpeech, SpeechPlayer, SpeechSynthesizer};
