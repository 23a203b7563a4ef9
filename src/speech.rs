//! One-shot speech synthesis played through the shared output channel

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::audio::device::DeviceError;
use crate::audio::output::AudioOutputChannel;
use crate::audio::pcm::{self, DecodeError};
use crate::inference::messages::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    PrebuiltVoiceConfig, SpeechConfig, TextPart, VoiceConfig,
};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Http(String),

    #[error("speech service returned {0}")]
    Api(String),

    #[error("speech response carried no audio")]
    NoAudio,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Turns a text snippet into base64 PCM at the playback sample rate
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<String, SpeechError>;
}

/// Speech synthesis through the Gemini `generateContent` endpoint with an
/// audio response modality
pub struct GeminiSpeech {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiSpeech {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GeminiSpeech {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<String, SpeechError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SpeechError::Api(response.status().to_string()));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Http(e.to_string()))?;

        body.audio_data()
            .map(str::to_string)
            .ok_or(SpeechError::NoAudio)
    }
}

/// Synthesizes speech and schedules it on the output channel
pub struct SpeechPlayer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<AudioOutputChannel>,
    voice: String,
}

impl SpeechPlayer {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<AudioOutputChannel>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            output,
            voice: voice.into(),
        }
    }

    /// Speak `text`; returns the playback start time on the device clock
    pub async fn say(&self, text: &str) -> Result<f64, SpeechError> {
        let payload = self.synthesizer.synthesize(text, &self.voice).await?;
        let frame = pcm::decode_chunk(&payload, pcm::PLAYBACK_SAMPLE_RATE)?;

        info!("Playing {:.2}s of synthesized speech", frame.duration_secs());

        Ok(self.output.enqueue(frame)?)
    }
}
