// Tests for one-shot speech synthesis playback
//
// A fake synthesizer returns canned PCM payloads; playback must go through
// the same monotonic schedule the live bridge uses.

use std::sync::{Arc, Mutex};

use tutor_voice::audio::pcm::{encode_chunk, PLAYBACK_SAMPLE_RATE};
use tutor_voice::audio::{AudioOutputChannel, DeviceError, OutputDevice, PlaybackFrame};
use tutor_voice::speech::{SpeechError, SpeechPlayer, SpeechSynthesizer};

#[derive(Default)]
struct FakeOutputDevice {
    scheduled: Mutex<Vec<(f64, f64)>>, // (start_time, duration)
}

impl OutputDevice for FakeOutputDevice {
    fn clock(&self) -> f64 {
        0.0
    }

    fn schedule(&self, frame: PlaybackFrame, start_time: f64) -> Result<(), DeviceError> {
        self.scheduled
            .lock()
            .unwrap()
            .push((start_time, frame.duration_secs()));
        Ok(())
    }
}

struct FakeSynthesizer {
    payload: String,
    fail: bool,
    voices: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str, voice: &str) -> Result<String, SpeechError> {
        self.voices.lock().unwrap().push(voice.to_string());
        if self.fail {
            return Err(SpeechError::Api("500 Internal Server Error".to_string()));
        }
        Ok(self.payload.clone())
    }
}

fn player(fail: bool) -> (SpeechPlayer, Arc<FakeOutputDevice>, Arc<Mutex<Vec<String>>>) {
    let device = Arc::new(FakeOutputDevice::default());
    let output = Arc::new(AudioOutputChannel::new(
        Arc::clone(&device) as Arc<dyn OutputDevice>
    ));

    // Half a second of quiet audio at the playback rate
    let payload = encode_chunk(&[0.25; 12000], PLAYBACK_SAMPLE_RATE).data;
    let voices = Arc::new(Mutex::new(Vec::new()));

    let synthesizer = FakeSynthesizer {
        payload,
        fail,
        voices: Arc::clone(&voices),
    };

    (
        SpeechPlayer::new(Arc::new(synthesizer), output, "Kore"),
        device,
        voices,
    )
}

#[tokio::test]
async fn test_say_schedules_decoded_audio() {
    let (player, device, _) = player(false);

    let starts_at = player.say("Hello there").await.expect("speech plays");
    assert_eq!(starts_at, 0.0);

    let scheduled = device.scheduled.lock().unwrap().clone();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0], (0.0, 0.5));
}

#[tokio::test]
async fn test_consecutive_says_queue_back_to_back() {
    let (player, device, _) = player(false);

    let first = player.say("First").await.unwrap();
    let second = player.say("Second").await.unwrap();

    assert_eq!(first, 0.0);
    assert_eq!(second, 0.5);

    let scheduled = device.scheduled.lock().unwrap().clone();
    assert_eq!(scheduled.len(), 2);
}

#[tokio::test]
async fn test_synthesis_failure_schedules_nothing() {
    let (player, device, _) = player(true);

    let result = player.say("Hello").await;
    assert!(matches!(result, Err(SpeechError::Api(_))));
    assert!(device.scheduled.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_configured_voice_is_used() {
    let (player, _, voices) = player(false);

    player.say("Hello").await.unwrap();
    assert_eq!(voices.lock().unwrap().as_slice(), ["Kore"]);
}
