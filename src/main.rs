use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tutor_voice::audio::{
    AudioOutputChannel, CaptureConfig, CpalCaptureDevice, CpalOutputDevice, PLAYBACK_SAMPLE_RATE,
};
use tutor_voice::{
    create_router, AppState, Config, GeminiLive, GeminiSpeech, LiveBridge, SpeechPlayer,
};

#[derive(Debug, Parser)]
#[command(name = "tutor-voice", about = "Live voice tutoring bridge")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/tutor-voice")]
    config: String,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    let api_key = if cfg.gemini.api_key.is_empty() {
        std::env::var("GEMINI_API_KEY").unwrap_or_default()
    } else {
        cfg.gemini.api_key.clone()
    };
    if api_key.is_empty() {
        anyhow::bail!("No API key configured (set GEMINI_API_KEY or gemini.api_key)");
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Live model: {} (voice: {})", cfg.live.model, cfg.live.voice);

    let output_device =
        CpalOutputDevice::open(PLAYBACK_SAMPLE_RATE).context("Failed to open output device")?;
    let output = Arc::new(AudioOutputChannel::new(Arc::new(output_device)));

    let capture = CpalCaptureDevice::new(CaptureConfig {
        buffer_size: cfg.live.capture_buffer_size,
        ..CaptureConfig::default()
    });

    let service = Arc::new(GeminiLive::new(api_key.clone()));
    let bridge = Arc::new(LiveBridge::new(
        cfg.live.clone(),
        service,
        Box::new(capture),
        Arc::clone(&output),
    ));

    let synthesizer = Arc::new(GeminiSpeech::new(api_key, cfg.gemini.speech_model.clone()));
    let speech = Arc::new(SpeechPlayer::new(
        synthesizer,
        output,
        cfg.gemini.speech_voice.clone(),
    ));

    let app = create_router(AppState::new(bridge, speech));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
