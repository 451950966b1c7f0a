//! PCM16 frame codec.
//!
//! Captured audio travels as normalized `f32` samples inside the crate and as
//! 16-bit signed little-endian PCM on the wire, wrapped in standard base64 so it
//! can be embedded in JSON messages.
//!
//! Scaling is linear over the signed 16-bit range: `x * 32768`, rounded and
//! saturated to `[-32768, 32767]`. Decoding divides by 32768, so a round trip
//! reproduces every sample in `[-1, 1]` within one quantization step.

use base64::prelude::*;
use bytes::Bytes;

use super::base::{AudioError, AudioResult};

/// Scale factor between normalized samples and PCM16.
pub const PCM16_SCALE: f32 = 32768.0;

/// Largest per-sample error introduced by an encode/decode round trip.
pub const QUANTIZATION_STEP: f32 = 1.0 / PCM16_SCALE;

/// Convert one normalized sample to PCM16.
#[inline]
pub fn sample_to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    };
    (clamped * PCM16_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Convert one PCM16 sample back to the normalized range.
#[inline]
pub fn pcm16_to_sample(value: i16) -> f32 {
    value as f32 / PCM16_SCALE
}

/// Encode normalized samples as little-endian PCM16 bytes.
pub fn encode_pcm16(frame: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * 2);
    for &sample in frame {
        bytes.extend_from_slice(&sample_to_pcm16(sample).to_le_bytes());
    }
    bytes
}

/// Decode little-endian PCM16 bytes into normalized samples.
///
/// A trailing odd byte cannot form a sample and is dropped.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| pcm16_to_sample(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Encode a frame into the base64 text carried by realtime input messages.
pub fn encode(frame: &[f32]) -> String {
    BASE64_STANDARD.encode(encode_pcm16(frame))
}

/// Unwrap the base64 transport encoding of an inbound payload.
pub fn decode_base64(payload: &str) -> AudioResult<Bytes> {
    BASE64_STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| AudioError::InvalidPayload(e.to_string()))
}

/// Decode a base64 PCM16 payload into normalized samples.
pub fn decode(payload: &str) -> AudioResult<Vec<f32>> {
    Ok(decode_pcm16(&decode_base64(payload)?))
}

/// Duration in seconds of `samples` at `sample_rate`.
#[inline]
pub fn duration_secs(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / sample_rate as f64
}
