use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::device::{CaptureConfig, CaptureDevice, DeviceError};

/// How many capture buffers may sit between the device callback and the
/// consumer before the callback starts dropping.
const CHANNEL_CAPACITY: usize = 16;

/// Microphone capture through cpal.
///
/// The cpal stream is not `Send`, so a dedicated thread owns it for the whole
/// capture lifetime. The device callback downmixes to mono, decimates to the
/// target sample rate and hands fixed-size buffers to a channel.
pub struct CpalCaptureDevice {
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

impl CpalCaptureDevice {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicUsize::new(0)),
            thread: None,
        }
    }

    /// Buffers dropped because the consumer fell behind
    pub fn dropped_buffers(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn build_stream(
    config: &CaptureConfig,
    buffer_tx: mpsc::Sender<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(DeviceError::NotFound)?;

    let supported = device.default_input_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => DeviceError::PermissionDenied,
        other => DeviceError::Stream(other.to_string()),
    })?;

    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(DeviceError::Unsupported(format!(
            "input sample format {:?}",
            supported.sample_format()
        )));
    }

    let device_rate = supported.config().sample_rate.0;
    let channels = supported.channels() as usize;
    let target_rate = config.sample_rate;

    // Decimation only handles integer ratios (48kHz -> 16kHz and friends),
    // matching how the session consumes microphone audio.
    if device_rate % target_rate != 0 {
        return Err(DeviceError::Unsupported(format!(
            "device rate {} Hz is not a multiple of {} Hz",
            device_rate, target_rate
        )));
    }
    let decimation = (device_rate / target_rate) as usize;

    let buffer_size = config.buffer_size;
    let mut pending: Vec<f32> = Vec::with_capacity(buffer_size);
    let mut phase: usize = 0;

    let stream = device
        .build_input_stream(
            &supported.config(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    if phase == 0 {
                        let sample = frame.iter().sum::<f32>() / channels as f32;
                        pending.push(sample);

                        if pending.len() >= buffer_size {
                            let full =
                                std::mem::replace(&mut pending, Vec::with_capacity(buffer_size));
                            if buffer_tx.try_send(full).is_err() {
                                dropped.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    phase = (phase + 1) % decimation;
                }
            },
            move |err| {
                warn!("Capture stream error: {}", err);
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => DeviceError::PermissionDenied,
            cpal::BuildStreamError::StreamConfigNotSupported => {
                DeviceError::Unsupported("requested input stream config".to_string())
            }
            other => DeviceError::Stream(other.to_string()),
        })?;

    stream
        .play()
        .map_err(|e| DeviceError::Stream(e.to_string()))?;

    Ok(stream)
}

#[async_trait::async_trait]
impl CaptureDevice for CpalCaptureDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, DeviceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(DeviceError::Stream("capture already running".to_string()));
        }

        let (buffer_tx, buffer_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), DeviceError>>();

        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let dropped = Arc::clone(&self.dropped);

        running.store(true, Ordering::SeqCst);

        let running_for_thread = Arc::clone(&self.running);
        let handle = thread::spawn(move || {
            match build_stream(&config, buffer_tx, dropped) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    while running_for_thread.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(20));
                    }
                    drop(stream);
                }
                Err(e) => {
                    running_for_thread.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                }
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.thread = Some(handle);
                info!(
                    "Microphone capture started ({} Hz, {}-sample buffers)",
                    self.config.sample_rate, self.config.buffer_size
                );
                Ok(buffer_rx)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(DeviceError::Stream(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(handle) = self.thread.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }

        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            warn!("Capture dropped {} buffers during the session", dropped);
        }

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}
