//! Per-session tuning.

use std::time::Duration;

use crate::core::audio::{
    CAPTURE_SAMPLE_RATE, DEFAULT_FRAME_SIZE, DEFAULT_NOISE_THRESHOLD, PLAYBACK_SAMPLE_RATE,
};
use crate::core::realtime::{GeminiLiveModel, GeminiVoice, Modality, SessionSetup};
use crate::core::tools::{SYSTEM_INSTRUCTION, tool_declarations};

/// Delay between channel open and the conversation trigger.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;

/// Delay between the `endCall` acknowledgement and the disconnect, long
/// enough for the closing utterance to play out.
pub const DEFAULT_END_CALL_DELAY_MS: u64 = 4000;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub capture_sample_rate: u32,
    pub playback_sample_rate: u32,
    /// Samples per capture tick.
    pub frame_size: usize,
    /// RMS below which a capture frame is zeroed.
    pub noise_threshold: f32,
    pub settle_delay: Duration,
    pub end_call_delay: Duration,
    /// Sent to the provider when the channel opens.
    pub setup: SessionSetup,
}

impl SessionConfig {
    /// MIME type for outbound audio at the configured capture rate.
    pub fn input_mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.capture_sample_rate)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: CAPTURE_SAMPLE_RATE,
            playback_sample_rate: PLAYBACK_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            end_call_delay: Duration::from_millis(DEFAULT_END_CALL_DELAY_MS),
            setup: SessionSetup {
                model: GeminiLiveModel::default().as_str().to_string(),
                voice: GeminiVoice::default().as_str().to_string(),
                instructions: SYSTEM_INSTRUCTION.trim().to_string(),
                tools: tool_declarations(),
                response_modalities: vec![Modality::Audio],
            },
        }
    }
}
