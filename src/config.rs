use anyhow::Result;
use serde::Deserialize;

use crate::live::LiveConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub live: LiveConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "tutor-voice".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; falls back to the GEMINI_API_KEY environment variable
    pub api_key: String,

    /// Model used for one-shot speech synthesis
    pub speech_model: String,

    /// Voice used for one-shot speech synthesis
    pub speech_voice: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            speech_voice: "Kore".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("TUTOR_VOICE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
