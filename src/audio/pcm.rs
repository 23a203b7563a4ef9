use base64::Engine;
use thiserror::Error;

use super::output::PlaybackFrame;

/// Sample rate the session expects for microphone audio.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of model-generated audio.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// MIME descriptor attached to outbound PCM chunks, e.g. `audio/pcm;rate=16000`.
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}

/// A base64 transport encoding of one PCM frame, consumed exactly once by the
/// session send call.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// MIME descriptor (`audio/pcm;rate=<hz>`)
    pub mime_type: String,
    /// Base64 of the little-endian 16-bit sample bytes
    pub data: String,
}

/// Errors produced while decoding an inbound audio payload
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PCM payload of {0} bytes is not a whole number of 16-bit samples")]
    TruncatedSample(usize),
}

/// Encode a buffer of float samples in [-1.0, 1.0] as a base64 PCM chunk.
///
/// Samples are scaled by the positive half-range (32767) and truncated toward
/// zero. Inputs are assumed already in range; no dithering is applied.
pub fn encode_chunk(samples: &[f32], sample_rate: u32) -> EncodedChunk {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let quantized = (sample * 32767.0) as i16;
        bytes.extend_from_slice(&quantized.to_le_bytes());
    }

    EncodedChunk {
        mime_type: pcm_mime_type(sample_rate),
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    }
}

/// Decode a base64 PCM payload into a playback frame at the given sample rate.
///
/// Each 16-bit sample is divided by the full range magnitude (32768). The
/// divisor intentionally differs from the encode-side 32767 so that decoded
/// output stays bit-compatible with the upstream service contract.
pub fn decode_chunk(data: &str, sample_rate: u32) -> Result<PlaybackFrame, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;

    if bytes.len() % 2 != 0 {
        return Err(DecodeError::TruncatedSample(bytes.len()));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(PlaybackFrame {
        samples,
        sample_rate,
    })
}
