//! Audio Test Fixtures
//!
//! Programmatically generated audio so tests have no file dependencies.
//!
//! Formats:
//! - Capture: 16kHz mono `f32` chunks, as delivered by a microphone
//! - Playback: 24kHz mono, base64 PCM16 payloads, as returned by the model

use std::f32::consts::PI;

use receptionist_live::core::audio::codec;

/// Capture rate (16kHz)
pub const CAPTURE_RATE: u32 = 16000;

/// Playback rate (24kHz)
pub const PLAYBACK_RATE: u32 = 24000;

/// One capture tick at the default frame size
pub const FRAME: usize = 2048;

/// 100ms of playback audio
pub const PLAYBACK_MS_100: usize = 2400;

/// Generate silence
pub fn silence(samples: usize) -> Vec<f32> {
    vec![0.0; samples]
}

/// Generate a sine tone at `rate`
pub fn sine(samples: usize, frequency: f32, amplitude: f32, rate: u32) -> Vec<f32> {
    let angular = 2.0 * PI * frequency / rate as f32;
    (0..samples)
        .map(|i| (angular * i as f32).sin() * amplitude)
        .collect()
}

/// Speech-like signal: a 220Hz carrier with a slow syllable envelope
pub fn speech_like(samples: usize, rate: u32) -> Vec<f32> {
    let carrier = 2.0 * PI * 220.0 / rate as f32;
    let envelope = 2.0 * PI * 4.0 / rate as f32;
    (0..samples)
        .map(|i| {
            let t = i as f32;
            let env = 0.5 + 0.5 * (envelope * t).sin();
            (carrier * t).sin() * env * 0.6
        })
        .collect()
}

/// Low-level hiss that the default noise gate should zero
pub fn hiss(samples: usize, amplitude: f32) -> Vec<f32> {
    let mut state: u64 = 12345;
    (0..samples)
        .map(|_| {
            // Linear congruential generator for reproducibility
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            let random = ((state >> 16) & 0x7FFF) as f32 / 0x7FFF as f32;
            (random * 2.0 - 1.0) * amplitude
        })
        .collect()
}

/// Base64 PCM16 payload of a tone lasting `samples` at the playback rate
pub fn playback_payload(samples: usize) -> String {
    codec::encode(&sine(samples, 440.0, 0.3, PLAYBACK_RATE))
}

/// Split a signal into device-sized chunks
pub fn chunked(signal: &[f32], chunk: usize) -> Vec<Vec<f32>> {
    signal.chunks(chunk).map(<[f32]>::to_vec).collect()
}
