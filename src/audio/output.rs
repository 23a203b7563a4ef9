use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::device::{DeviceError, OutputDevice};

/// A single mono frame of float samples ready for playback
#[derive(Debug, Clone)]
pub struct PlaybackFrame {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl PlaybackFrame {
    /// Playback duration of this frame in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Owns the playback cursor for one output device.
///
/// Frames enqueued here play back-to-back in arrival order: each frame starts
/// at `max(device_clock, next_start_time)` and advances `next_start_time` by
/// its own duration, so scheduled frames never overlap regardless of how
/// irregularly they arrive.
pub struct AudioOutputChannel {
    device: Arc<dyn OutputDevice>,
    next_start_time: Mutex<f64>,
}

impl AudioOutputChannel {
    pub fn new(device: Arc<dyn OutputDevice>) -> Self {
        Self {
            device,
            next_start_time: Mutex::new(0.0),
        }
    }

    /// Schedule a frame per the monotonic playback rule.
    ///
    /// Returns the start time assigned to the frame.
    pub fn enqueue(&self, frame: PlaybackFrame) -> Result<f64, DeviceError> {
        // Hold the cursor across the clock read and the schedule call so two
        // concurrent callers cannot be assigned overlapping start times.
        let mut next_start_time = self.next_start_time.lock();

        let start_time = self.device.clock().max(*next_start_time);
        let duration = frame.duration_secs();

        self.device.schedule(frame, start_time)?;
        *next_start_time = start_time + duration;

        debug!(
            "Scheduled playback frame at {:.3}s ({:.3}s long)",
            start_time, duration
        );

        Ok(start_time)
    }

    /// Reset the playback cursor (on session teardown)
    pub fn reset(&self) {
        *self.next_start_time.lock() = 0.0;
    }

    /// Earliest time the next enqueued frame may begin playing
    pub fn next_start_time(&self) -> f64 {
        *self.next_start_time.lock()
    }
}
