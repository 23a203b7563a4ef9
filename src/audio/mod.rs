pub mod capture;
pub mod device;
pub mod output;
pub mod pcm;
pub mod playback;

pub use capture::CpalCaptureDevice;
pub use device::{CaptureConfig, CaptureDevice, DeviceError, OutputDevice};
pub use output::{AudioOutputChannel, PlaybackFrame};
pub use pcm::{
    decode_chunk, encode_chunk, pcm_mime_type, DecodeError, EncodedChunk, CAPTURE_SAMPLE_RATE,
    PLAYBACK_SAMPLE_RATE,
};
pub use playback::CpalOutputDevice;
