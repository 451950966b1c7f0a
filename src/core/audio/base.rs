//! Base traits and types for the duplex audio pipeline.
//!
//! The session manager never talks to audio hardware directly. It acquires
//! resources through an [`AudioBackend`], which hands out:
//!
//! - a capture context (16 kHz mono) that owns the input clock,
//! - a [`PlaybackContext`] (24 kHz mono) exposing a playback clock and a way to
//!   start decoded buffers at an absolute time on that clock,
//! - a [`MicrophoneStream`] whose tracks can be stopped and whose samples are
//!   delivered over a channel.
//!
//! The host implementation lives in `device` (behind the `device-audio`
//! feature); tests provide in-memory backends.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while acquiring or driving audio resources.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No usable input or output device
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Microphone access was refused
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    /// The device rejected the requested stream configuration
    #[error("Unsupported stream configuration: {0}")]
    UnsupportedConfig(String),

    /// The context was already closed
    #[error("Audio context closed")]
    ContextClosed,

    /// An inbound payload could not be decoded
    #[error("Invalid audio payload: {0}")]
    InvalidPayload(String),

    /// Stream construction or playback failure
    #[error("Audio stream error: {0}")]
    StreamError(String),
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

// =============================================================================
// Buffers and Constraints
// =============================================================================

/// A decoded, playable block of mono samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length of the buffer on the playback clock, in seconds.
    pub fn duration(&self) -> f64 {
        super::codec::duration_secs(self.samples.len(), self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Microphone capture preferences.
///
/// Processing flags are hints. Backends that cannot honour them still open
/// the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConstraints {
    pub channel_count: u16,
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl CaptureConstraints {
    /// Mono speech capture at `sample_rate` with every processing hint enabled.
    pub fn speech(sample_rate: u32) -> Self {
        Self {
            channel_count: 1,
            sample_rate,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

// =============================================================================
// Resource Traits
// =============================================================================

/// Common surface of capture and playback contexts.
pub trait AudioContext: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Release the context. Closing an already closed context is an error the
    /// caller is expected to ignore.
    fn close(&self) -> AudioResult<()>;

    fn is_closed(&self) -> bool;
}

/// Callback fired once a started buffer has played out naturally.
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

/// A buffer that has been handed to a playback context.
pub trait ScheduledSource: Send + Sync {
    /// Stop playback immediately. The ended callback is not fired.
    fn stop(&self) -> AudioResult<()>;
}

/// Output context with its own clock.
pub trait PlaybackContext: AudioContext {
    /// Current position of the playback clock, in seconds.
    fn current_time(&self) -> f64;

    /// Start `buffer` at `when` seconds on the playback clock.
    ///
    /// `on_ended` runs after the last sample has been rendered. Implementations
    /// must not invoke it from inside `start`.
    fn start(
        &self,
        buffer: AudioBuffer,
        when: f64,
        on_ended: EndedCallback,
    ) -> AudioResult<Box<dyn ScheduledSource>>;
}

/// One live input track of a microphone stream.
pub trait MediaTrack: Send + Sync {
    fn label(&self) -> &str;

    fn stop(&self) -> AudioResult<()>;

    fn is_live(&self) -> bool;
}

/// An opened microphone: its tracks plus the channel the raw samples arrive on.
///
/// Chunks arrive in whatever sizes the device delivers; the capture pipeline
/// re-frames them.
pub struct MicrophoneStream {
    pub tracks: Vec<Arc<dyn MediaTrack>>,
    pub samples: mpsc::Receiver<Vec<f32>>,
}

impl MicrophoneStream {
    /// Stop every live track, returning the failures so callers can log them.
    pub fn stop_tracks(tracks: &[Arc<dyn MediaTrack>]) -> Vec<AudioError> {
        tracks
            .iter()
            .filter(|track| track.is_live())
            .filter_map(|track| track.stop().err())
            .collect()
    }
}

/// Factory for the audio resources a session needs.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Open and resume an input context running at `sample_rate`.
    async fn open_capture_context(&self, sample_rate: u32) -> AudioResult<Arc<dyn AudioContext>>;

    /// Open and resume an output context running at `sample_rate`.
    async fn open_playback_context(
        &self,
        sample_rate: u32,
    ) -> AudioResult<Arc<dyn PlaybackContext>>;

    /// Request microphone access.
    async fn open_microphone(
        &self,
        constraints: &CaptureConstraints,
    ) -> AudioResult<MicrophoneStream>;
}
