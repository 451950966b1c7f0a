//! Duplex audio pipeline.
//!
//! # Formats
//!
//! - Capture: 16 kHz mono, framed at 2048 samples, sent as base64 PCM16 LE
//! - Playback: 24 kHz mono, received as base64 PCM16 LE
//!
//! # Modules
//!
//! - `codec`: `f32` <-> PCM16 <-> base64
//! - `gate`: RMS noise gate and volume meter
//! - `capture`: re-framing, gating and encoding of microphone audio
//! - `playback`: gapless scheduling with interruption
//! - `timeline`: software mixer implementing the playback clock
//! - `device`: CPAL host backend (feature `device-audio`)

mod base;
pub mod capture;
pub mod codec;
#[cfg(feature = "device-audio")]
pub mod device;
pub mod gate;
pub mod playback;
pub mod timeline;

pub use base::{
    AudioBackend, AudioBuffer, AudioContext, AudioError, AudioResult, CaptureConstraints,
    EndedCallback, MediaTrack, MicrophoneStream, PlaybackContext, ScheduledSource,
};
pub use capture::{CapturePipeline, CapturedFrame, DEFAULT_FRAME_SIZE, FrameAccumulator};
#[cfg(feature = "device-audio")]
pub use device::DeviceBackend;
pub use gate::{DEFAULT_NOISE_THRESHOLD, GatedFrame, NoiseGate};
pub use playback::{PlaybackScheduler, ScheduledBuffer};
pub use timeline::{StreamResampler, Timeline, downmix, resample_linear};

/// Capture context rate expected by the realtime input.
pub const CAPTURE_SAMPLE_RATE: u32 = 16000;

/// Rate of the audio returned by the model.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;
