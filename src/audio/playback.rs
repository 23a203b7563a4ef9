use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{info, warn};

use super::device::{DeviceError, OutputDevice};
use super::output::PlaybackFrame;

struct ScheduledFrame {
    start_sample: u64,
    samples: Vec<f32>,
}

struct PlaybackShared {
    sample_rate: u32,
    /// Count of mono frames emitted so far; the device clock
    clock_samples: AtomicU64,
    queue: Mutex<Vec<ScheduledFrame>>,
}

/// Speaker output through cpal.
///
/// A dedicated thread owns the output stream; the data callback mixes every
/// queued frame whose start position overlaps the current callback window
/// into the output buffer, so playback is sample-accurate against the
/// emitted-sample clock.
pub struct CpalOutputDevice {
    shared: Arc<PlaybackShared>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutputDevice {
    /// Open the default output device at the given mono sample rate
    pub fn open(sample_rate: u32) -> Result<Self, DeviceError> {
        let shared = Arc::new(PlaybackShared {
            sample_rate,
            clock_samples: AtomicU64::new(0),
            queue: Mutex::new(Vec::new()),
        });

        let running = Arc::new(AtomicBool::new(true));

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), DeviceError>>();
        let shared_for_thread = Arc::clone(&shared);
        let running_for_thread = Arc::clone(&running);

        let handle = thread::spawn(move || {
            match build_output_stream(&shared_for_thread) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    while running_for_thread.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(50));
                    }
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        });

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {
                info!("Output device opened at {} Hz", sample_rate);
                Ok(Self {
                    shared,
                    running,
                    thread: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                Err(DeviceError::Stream(
                    "output device did not start in time".to_string(),
                ))
            }
        }
    }
}

fn build_output_stream(shared: &Arc<PlaybackShared>) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(DeviceError::NotFound)?;

    let supported = device.default_output_config().map_err(|e| match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => DeviceError::NotFound,
        other => DeviceError::Stream(other.to_string()),
    })?;

    let channels = supported.channels() as usize;
    let config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(shared.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let sample_rate = shared.sample_rate;
    let shared = Arc::clone(shared);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                data.fill(0.0);

                let frames_out = data.len() / channels;
                let window_start = shared.clock_samples.load(Ordering::Acquire);
                let window_end = window_start + frames_out as u64;

                let mut queue = shared.queue.lock();
                for frame in queue.iter() {
                    let frame_start = frame.start_sample;
                    let frame_end = frame_start + frame.samples.len() as u64;

                    let lo = frame_start.max(window_start);
                    let hi = frame_end.min(window_end);
                    for position in lo..hi {
                        let value = frame.samples[(position - frame_start) as usize];
                        let base = (position - window_start) as usize * channels;
                        for channel in 0..channels {
                            data[base + channel] += value;
                        }
                    }
                }
                queue.retain(|f| f.start_sample + f.samples.len() as u64 > window_end);
                drop(queue);

                shared.clock_samples.store(window_end, Ordering::Release);
            },
            move |err| {
                warn!("Playback stream error: {}", err);
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::StreamConfigNotSupported => DeviceError::Unsupported(format!(
                "output device does not support {} Hz",
                sample_rate
            )),
            other => DeviceError::Stream(other.to_string()),
        })?;

    stream
        .play()
        .map_err(|e| DeviceError::Stream(e.to_string()))?;

    Ok(stream)
}

impl OutputDevice for CpalOutputDevice {
    fn clock(&self) -> f64 {
        self.shared.clock_samples.load(Ordering::Acquire) as f64 / self.shared.sample_rate as f64
    }

    fn schedule(&self, frame: PlaybackFrame, start_time: f64) -> Result<(), DeviceError> {
        if frame.sample_rate != self.shared.sample_rate {
            return Err(DeviceError::Unsupported(format!(
                "frame rate {} Hz does not match device rate {} Hz",
                frame.sample_rate, self.shared.sample_rate
            )));
        }

        let start_sample = (start_time * self.shared.sample_rate as f64).round() as u64;
        self.shared.queue.lock().push(ScheduledFrame {
            start_sample,
            samples: frame.samples,
        });

        Ok(())
    }
}

impl Drop for CpalOutputDevice {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
