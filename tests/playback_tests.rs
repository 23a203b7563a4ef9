// Tests for the monotonic playback schedule
//
// The output channel must assign start times so inbound frames play
// back-to-back with no overlap, whatever the arrival timing.

use std::sync::{Arc, Mutex};

use tutor_voice::audio::{AudioOutputChannel, DeviceError, OutputDevice, PlaybackFrame};

/// Output device with a manually driven clock that records every schedule call
#[derive(Default)]
struct FakeOutputDevice {
    clock: Mutex<f64>,
    scheduled: Mutex<Vec<(f64, f64)>>, // (start_time, duration)
}

impl FakeOutputDevice {
    fn set_clock(&self, t: f64) {
        *self.clock.lock().unwrap() = t;
    }

    fn scheduled(&self) -> Vec<(f64, f64)> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl OutputDevice for FakeOutputDevice {
    fn clock(&self) -> f64 {
        *self.clock.lock().unwrap()
    }

    fn schedule(&self, frame: PlaybackFrame, start_time: f64) -> Result<(), DeviceError> {
        self.scheduled
            .lock()
            .unwrap()
            .push((start_time, frame.duration_secs()));
        Ok(())
    }
}

fn frame_of(duration_secs: f64) -> PlaybackFrame {
    PlaybackFrame {
        samples: vec![0.0; (duration_secs * 24000.0).round() as usize],
        sample_rate: 24000,
    }
}

#[test]
fn test_back_to_back_frames_do_not_overlap() {
    // Two frames of 1.0s and 0.5s arriving with the clock at 0 must start at
    // 0.0 and 1.0, not 0.0 and 0.5
    let device = Arc::new(FakeOutputDevice::default());
    let channel = AudioOutputChannel::new(Arc::clone(&device) as Arc<dyn OutputDevice>);

    let first = channel.enqueue(frame_of(1.0)).unwrap();
    let second = channel.enqueue(frame_of(0.5)).unwrap();

    assert_eq!(first, 0.0);
    assert_eq!(second, 1.0);
    assert_eq!(channel.next_start_time(), 1.5);
}

#[test]
fn test_device_clock_ahead_of_cursor_wins() {
    let device = Arc::new(FakeOutputDevice::default());
    let channel = AudioOutputChannel::new(Arc::clone(&device) as Arc<dyn OutputDevice>);

    channel.enqueue(frame_of(0.5)).unwrap();
    assert_eq!(channel.next_start_time(), 0.5);

    // Playback has moved well past the cursor; the next frame starts "now"
    device.set_clock(3.0);
    let start = channel.enqueue(frame_of(0.25)).unwrap();

    assert_eq!(start, 3.0);
    assert_eq!(channel.next_start_time(), 3.25);
}

#[test]
fn test_start_times_are_monotonic_without_gaps_or_overlap() {
    let device = Arc::new(FakeOutputDevice::default());
    let channel = AudioOutputChannel::new(Arc::clone(&device) as Arc<dyn OutputDevice>);

    let durations = [0.25, 0.1, 0.5, 0.05, 0.3];
    for (i, &d) in durations.iter().enumerate() {
        // Clock creeps forward irregularly, but always behind the cursor
        device.set_clock(i as f64 * 0.01);
        channel.enqueue(frame_of(d)).unwrap();
    }

    let scheduled = device.scheduled();
    assert_eq!(scheduled.len(), durations.len());

    for window in scheduled.windows(2) {
        let (prev_start, prev_duration) = window[0];
        let (next_start, _) = window[1];
        assert!(next_start >= prev_start, "start times must be non-decreasing");
        assert!(
            next_start >= prev_start + prev_duration - 1e-9,
            "frame starting at {} overlaps previous frame ending at {}",
            next_start,
            prev_start + prev_duration
        );
    }
}

#[test]
fn test_reset_rewinds_the_cursor() {
    let device = Arc::new(FakeOutputDevice::default());
    let channel = AudioOutputChannel::new(Arc::clone(&device) as Arc<dyn OutputDevice>);

    channel.enqueue(frame_of(2.0)).unwrap();
    assert_eq!(channel.next_start_time(), 2.0);

    channel.reset();
    assert_eq!(channel.next_start_time(), 0.0);

    let start = channel.enqueue(frame_of(0.5)).unwrap();
    assert_eq!(start, 0.0);
}

#[test]
fn test_zero_length_frame_advances_nothing() {
    let device = Arc::new(FakeOutputDevice::default());
    let channel = AudioOutputChannel::new(Arc::clone(&device) as Arc<dyn OutputDevice>);

    let start = channel.enqueue(frame_of(0.0)).unwrap();
    assert_eq!(start, 0.0);
    assert_eq!(channel.next_start_time(), 0.0);
}
