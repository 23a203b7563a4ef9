// Unit tests for the PCM transport encoding
//
// These cover the float <-> 16-bit conversions and the base64 chunk format
// the live session sends and receives.

use base64::Engine;
use tutor_voice::audio::pcm::{
    decode_chunk, encode_chunk, pcm_mime_type, DecodeError, CAPTURE_SAMPLE_RATE,
    PLAYBACK_SAMPLE_RATE,
};

#[test]
fn test_mime_descriptor() {
    assert_eq!(pcm_mime_type(16000), "audio/pcm;rate=16000");
    assert_eq!(pcm_mime_type(24000), "audio/pcm;rate=24000");

    let chunk = encode_chunk(&[0.0; 4], CAPTURE_SAMPLE_RATE);
    assert_eq!(chunk.mime_type, "audio/pcm;rate=16000");
}

#[test]
fn test_silence_round_trips_exactly() {
    // A full capture buffer of silence must survive the transport encoding
    // bit-for-bit
    let silence = vec![0.0f32; 4096];
    let chunk = encode_chunk(&silence, CAPTURE_SAMPLE_RATE);

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&chunk.data)
        .expect("chunk data is valid base64");
    assert_eq!(bytes.len(), 4096 * 2);
    assert!(bytes.iter().all(|&b| b == 0));

    let frame = decode_chunk(&chunk.data, CAPTURE_SAMPLE_RATE).expect("silence decodes");
    assert_eq!(frame.samples.len(), 4096);
    assert!(frame.samples.iter().all(|&s| s == 0.0));
}

#[test]
fn test_round_trip_is_quantization_bounded() {
    let inputs: Vec<f32> = vec![
        -1.0, -0.75, -0.5003, -0.25, -0.0001, 0.0, 0.0001, 0.125, 0.33, 0.5, 0.9999, 1.0,
    ];

    let chunk = encode_chunk(&inputs, CAPTURE_SAMPLE_RATE);
    let frame = decode_chunk(&chunk.data, CAPTURE_SAMPLE_RATE).expect("decodes");

    assert_eq!(frame.samples.len(), inputs.len());
    for (original, decoded) in inputs.iter().zip(frame.samples.iter()) {
        let error = (original - decoded).abs();
        // One count of truncation plus one count of scale mismatch
        assert!(
            error <= 2.0 / 32768.0,
            "sample {} decoded to {} (error {})",
            original,
            decoded,
            error
        );
    }
}

#[test]
fn test_encode_uses_positive_half_range() {
    // Full-scale positive input quantizes to 32767, not 32768
    let chunk = encode_chunk(&[1.0], CAPTURE_SAMPLE_RATE);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&chunk.data)
        .unwrap();
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 32767);
}

#[test]
fn test_decode_uses_full_range() {
    // i16::MIN maps to exactly -1.0, i16::MAX to just under 1.0
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&i16::MIN.to_le_bytes());
    bytes.extend_from_slice(&i16::MAX.to_le_bytes());
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);

    let frame = decode_chunk(&data, PLAYBACK_SAMPLE_RATE).expect("decodes");
    assert_eq!(frame.samples[0], -1.0);
    assert_eq!(frame.samples[1], 32767.0 / 32768.0);
}

#[test]
fn test_decoded_frame_duration() {
    let samples = vec![0.0f32; 12000];
    let chunk = encode_chunk(&samples, PLAYBACK_SAMPLE_RATE);
    let frame = decode_chunk(&chunk.data, PLAYBACK_SAMPLE_RATE).unwrap();

    assert_eq!(frame.sample_rate, 24000);
    assert!((frame.duration_secs() - 0.5).abs() < 1e-9);
}

#[test]
fn test_odd_byte_count_is_a_decode_error() {
    let data = base64::engine::general_purpose::STANDARD.encode([0u8, 0, 0]);

    match decode_chunk(&data, PLAYBACK_SAMPLE_RATE) {
        Err(DecodeError::TruncatedSample(len)) => assert_eq!(len, 3),
        other => panic!("expected TruncatedSample, got {:?}", other),
    }
}

#[test]
fn test_malformed_base64_is_a_decode_error() {
    match decode_chunk("not base64!!!", PLAYBACK_SAMPLE_RATE) {
        Err(DecodeError::Base64(_)) => {}
        other => panic!("expected Base64 error, got {:?}", other),
    }
}

#[test]
fn test_truncation_matches_toward_zero() {
    // -0.25 * 32767 = -8191.75, truncation toward zero gives -8191
    let chunk = encode_chunk(&[-0.25], CAPTURE_SAMPLE_RATE);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&chunk.data)
        .unwrap();
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), -8191);
}
