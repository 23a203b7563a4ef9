use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::LiveConfig;
use super::status::{BridgeState, BridgeStats, StatusInner, LEVEL_BARS};
use crate::audio::device::CaptureDevice;
use crate::audio::output::AudioOutputChannel;
use crate::audio::pcm;
use crate::inference::messages::{MediaChunk, RealtimeInput};
use crate::inference::session::{SessionEvent, SessionService, SessionSettings, SessionSink};

/// Errors surfaced by [`LiveBridge::start`]
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("a live session is already active")]
    AlreadyActive,

    #[error("microphone permission denied or device unavailable")]
    PermissionDenied,

    #[error("failed to open live session: {0}")]
    ConnectionFailed(String),
}

/// Bridges the local microphone and speaker to a duplex speech session.
///
/// One bridge owns at most one live session at a time. Concurrent sessions
/// are modeled as independently owned bridge instances, each constructed
/// with its own [`AudioOutputChannel`].
pub struct LiveBridge {
    config: LiveConfig,

    /// Opens duplex sessions against the inference service
    service: Arc<dyn SessionService>,

    /// Microphone device, held for the whole bridge lifetime
    capture: Arc<AsyncMutex<Box<dyn CaptureDevice>>>,

    /// Playback cursor shared with other producers of output audio
    output: Arc<AudioOutputChannel>,

    /// Observable state plus status line
    status: Arc<Mutex<StatusInner>>,

    /// Whether a session pipeline currently exists
    active: Arc<AtomicBool>,

    /// Whether the service has acknowledged the session as open
    opened: Arc<AtomicBool>,

    started_at: Arc<Mutex<Option<chrono::DateTime<Utc>>>>,
    session_id: Arc<Mutex<Option<String>>>,

    frames_sent: Arc<AtomicUsize>,
    frames_scheduled: Arc<AtomicUsize>,

    /// Visualization levels updated on every capture buffer
    levels: Arc<Mutex<[f32; LEVEL_BARS]>>,

    cancel: Mutex<Option<CancellationToken>>,
    tasks: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl LiveBridge {
    pub fn new(
        config: LiveConfig,
        service: Arc<dyn SessionService>,
        capture: Box<dyn CaptureDevice>,
        output: Arc<AudioOutputChannel>,
    ) -> Self {
        Self {
            config,
            service,
            capture: Arc::new(AsyncMutex::new(capture)),
            output,
            status: Arc::new(Mutex::new(StatusInner::default())),
            active: Arc::new(AtomicBool::new(false)),
            opened: Arc::new(AtomicBool::new(false)),
            started_at: Arc::new(Mutex::new(None)),
            session_id: Arc::new(Mutex::new(None)),
            frames_sent: Arc::new(AtomicUsize::new(0)),
            frames_scheduled: Arc::new(AtomicUsize::new(0)),
            levels: Arc::new(Mutex::new([0.0; LEVEL_BARS])),
            cancel: Mutex::new(None),
            tasks: AsyncMutex::new(Vec::new()),
        }
    }

    /// Start a live session.
    ///
    /// Acquires the microphone, then opens the duplex session; returns once
    /// both succeeded. All further progress is driven by device buffers and
    /// transport events. At most one capture pipeline and one session are
    /// active at a time.
    pub async fn start(&self) -> Result<(), BridgeError> {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("Live session already active");
            return Err(BridgeError::AlreadyActive);
        }

        self.set_status(BridgeState::Connecting, "Connecting...");
        let session_id = format!("live-{}", uuid::Uuid::new_v4());
        *self.session_id.lock() = Some(session_id.clone());

        info!("Starting live session: {}", session_id);

        // Microphone first: if access is denied, no session is opened
        let buffers = match self.capture.lock().await.start().await {
            Ok(buffers) => buffers,
            Err(e) => {
                warn!("Microphone unavailable: {}", e);
                self.set_status(BridgeState::Disconnected, "Microphone Permission Denied");
                *self.session_id.lock() = None;
                self.active.store(false, Ordering::SeqCst);
                return Err(BridgeError::PermissionDenied);
            }
        };

        let settings = SessionSettings {
            model: self.config.model.clone(),
            voice: self.config.voice.clone(),
        };

        let session = match self.service.open(&settings).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to open live session: {}", e);
                if let Err(stop_err) = self.capture.lock().await.stop().await {
                    warn!("Failed to release capture device: {}", stop_err);
                }
                self.set_status(BridgeState::Disconnected, "Connection Failed");
                *self.session_id.lock() = None;
                self.active.store(false, Ordering::SeqCst);
                return Err(BridgeError::ConnectionFailed(e.to_string()));
            }
        };

        *self.started_at.lock() = Some(Utc::now());
        self.frames_sent.store(0, Ordering::Relaxed);
        self.frames_scheduled.store(0, Ordering::Relaxed);

        let cancel = CancellationToken::new();
        *self.cancel.lock() = Some(cancel.clone());

        let (chunk_tx, chunk_rx) = mpsc::channel(self.config.outbound_queue_size);

        let mut tasks = self.tasks.lock().await;
        tasks.push(self.spawn_capture_task(buffers, chunk_tx, cancel.clone()));
        tasks.push(self.spawn_send_task(session.sink, chunk_rx, cancel.clone()));
        tasks.push(self.spawn_event_task(session.events, cancel));
        drop(tasks);

        info!("Live session started: {}", session_id);
        Ok(())
    }

    /// Stop the live session and release every resource (idempotent).
    ///
    /// When already disconnected this performs no device or session calls.
    pub async fn stop(&self) -> BridgeStats {
        if !self.active.load(Ordering::SeqCst) {
            debug!("Live bridge already disconnected");
            return self.stats();
        }

        info!("Stopping live session");

        if let Some(cancel) = self.cancel.lock().take() {
            cancel.cancel();
        }

        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Bridge task panicked: {}", e);
            }
        }

        release_session(&self.capture, &self.output, &self.opened, &self.active).await;

        *self.started_at.lock() = None;
        *self.session_id.lock() = None;
        *self.levels.lock() = [0.0; LEVEL_BARS];
        self.set_status(BridgeState::Disconnected, "Disconnected");

        info!("Live session stopped");
        self.stats()
    }

    /// Current connection state
    pub fn state(&self) -> BridgeState {
        self.status.lock().state
    }

    /// Snapshot of the current session
    pub fn stats(&self) -> BridgeStats {
        let (state, detail) = {
            let status = self.status.lock();
            (status.state, status.detail.clone())
        };

        let started_at = *self.started_at.lock();
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        BridgeStats {
            state,
            status: detail,
            session_id: self.session_id.lock().clone(),
            started_at,
            duration_secs,
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_scheduled: self.frames_scheduled.load(Ordering::Relaxed),
            levels: self.levels.lock().to_vec(),
        }
    }

    fn set_status(&self, state: BridgeState, detail: &str) {
        set_status(&self.status, state, detail);
    }

    /// Capture -> encode: convert float buffers to PCM chunks and push them
    /// onto the bounded outbound queue. The push awaits queue capacity, so a
    /// busy session back-pressures the encoder instead of dropping chunks.
    fn spawn_capture_task(
        &self,
        mut buffers: mpsc::Receiver<Vec<f32>>,
        chunk_tx: mpsc::Sender<pcm::EncodedChunk>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let opened = Arc::clone(&self.opened);
        let levels = Arc::clone(&self.levels);

        tokio::spawn(async move {
            debug!("Capture task started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    buffer = buffers.recv() => {
                        let Some(buffer) = buffer else { break };

                        // Buffers captured before the session is open are discarded
                        if !opened.load(Ordering::SeqCst) {
                            continue;
                        }

                        *levels.lock() = meter_levels(&buffer);

                        let chunk = pcm::encode_chunk(&buffer, pcm::CAPTURE_SAMPLE_RATE);
                        if chunk_tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("Capture task stopped");
        })
    }

    /// Drain the outbound queue into the session sink, in capture order.
    /// Sends are fire-and-forget: a failed send is logged and the loop keeps
    /// going; real transport failures also surface as session error events.
    fn spawn_send_task(
        &self,
        mut sink: Box<dyn SessionSink>,
        mut chunk_rx: mpsc::Receiver<pcm::EncodedChunk>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let frames_sent = Arc::clone(&self.frames_sent);

        tokio::spawn(async move {
            debug!("Send task started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    chunk = chunk_rx.recv() => {
                        let Some(chunk) = chunk else { break };

                        let input = RealtimeInput {
                            media: MediaChunk {
                                mime_type: chunk.mime_type,
                                data: chunk.data,
                            },
                        };

                        if let Err(e) = sink.send(input).await {
                            error!("Failed to send audio chunk: {}", e);
                        } else {
                            frames_sent.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }

            if let Err(e) = sink.close().await {
                debug!("Session sink close: {}", e);
            }

            debug!("Send task stopped");
        })
    }

    /// Receive session events: open the pipeline, decode and schedule audio
    /// payloads, and tear everything down when the session ends.
    fn spawn_event_task(
        &self,
        mut events: mpsc::Receiver<SessionEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let capture = Arc::clone(&self.capture);
        let output = Arc::clone(&self.output);
        let status = Arc::clone(&self.status);
        let active = Arc::clone(&self.active);
        let opened = Arc::clone(&self.opened);
        let started_at = Arc::clone(&self.started_at);
        let frames_scheduled = Arc::clone(&self.frames_scheduled);

        tokio::spawn(async move {
            debug!("Event task started");

            let terminal: Option<String> = loop {
                tokio::select! {
                    _ = cancel.cancelled() => break None,
                    event = events.recv() => match event {
                        None => break Some("Disconnected".to_string()),
                        Some(SessionEvent::Opened) => {
                            opened.store(true, Ordering::SeqCst);
                            set_status(&status, BridgeState::Connected, "Live Connected - Speak Now");
                            info!("Live session open");
                        }
                        Some(SessionEvent::Message(message)) => {
                            // Non-audio payloads are ignored
                            let Some(payload) = message.audio_data() else { continue };

                            match pcm::decode_chunk(payload, pcm::PLAYBACK_SAMPLE_RATE) {
                                Ok(frame) => match output.enqueue(frame) {
                                    Ok(_) => {
                                        frames_scheduled.fetch_add(1, Ordering::Relaxed);
                                    }
                                    Err(e) => {
                                        error!("Failed to schedule playback frame: {}", e);
                                        break Some("Error Occurred".to_string());
                                    }
                                },
                                Err(e) => {
                                    warn!("Malformed audio payload, ending session: {}", e);
                                    break Some("Audio Decode Failed".to_string());
                                }
                            }
                        }
                        Some(SessionEvent::Closed) => {
                            info!("Live session closed by service");
                            break Some("Disconnected".to_string());
                        }
                        Some(SessionEvent::Error(e)) => {
                            error!("Live session transport error: {}", e);
                            break Some("Error Occurred".to_string());
                        }
                    }
                }
            };

            // The session ended on its own; run the same teardown stop() would
            if let Some(detail) = terminal {
                cancel.cancel();
                release_session(&capture, &output, &opened, &active).await;
                *started_at.lock() = None;
                set_status(&status, BridgeState::Disconnected, &detail);
            }

            debug!("Event task stopped");
        })
    }
}

fn set_status(status: &Mutex<StatusInner>, state: BridgeState, detail: &str) {
    let mut status = status.lock();
    status.state = state;
    status.detail = detail.to_string();
}

/// Release the capture device and reset the playback cursor. Runs on every
/// exit path: explicit stop, transport close or error, and decode failure.
async fn release_session(
    capture: &AsyncMutex<Box<dyn CaptureDevice>>,
    output: &AudioOutputChannel,
    opened: &AtomicBool,
    active: &AtomicBool,
) {
    if let Err(e) = capture.lock().await.stop().await {
        warn!("Failed to release capture device: {}", e);
    }
    output.reset();
    opened.store(false, Ordering::SeqCst);
    active.store(false, Ordering::SeqCst);
}

/// Cheap magnitude estimate per display bar; liveness feedback, not a
/// spectral measure.
fn meter_levels(samples: &[f32]) -> [f32; LEVEL_BARS] {
    let mut levels = [0.0f32; LEVEL_BARS];
    if samples.is_empty() {
        return levels;
    }

    let segment = samples.len().div_ceil(LEVEL_BARS);
    for (i, level) in levels.iter_mut().enumerate() {
        let lo = (i * segment).min(samples.len());
        let hi = ((i + 1) * segment).min(samples.len());
        let slice = &samples[lo..hi];
        if slice.is_empty() {
            continue;
        }

        let mean = slice.iter().map(|s| s.abs()).sum::<f32>() / slice.len() as f32;
        *level = (mean * 400.0).min(100.0);
    }

    levels
}
