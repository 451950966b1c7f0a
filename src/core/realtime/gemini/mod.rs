//! Gemini Live API module.
//!
//! Realtime speech-to-speech sessions with Gemini's native audio models.
//!
//! # Features
//!
//! - Bidirectional audio streaming
//! - Prebuilt voice selection
//! - Function calling with tool responses
//! - Barge-in (server-side interruption)
//!
//! # Supported Models
//!
//! - `gemini-2.5-flash-native-audio-preview-09-2025` - Native audio dialog (default)
//! - `gemini-live-2.5-flash-preview` - Half-cascade Live model
//! - `gemini-2.0-flash-live-001` - Gemini 2.0 Flash Live
//!
//! # Supported Voices
//!
//! Puck, Charon, Kore, Fenrir, Aoede, Leda, Orus, Zephyr
//!
//! # Audio Format
//!
//! Input is PCM 16-bit signed little-endian at 16kHz, output is the same at 24kHz.

mod client;
mod config;
pub mod messages;

pub use client::{GeminiLiveChannel, GeminiLiveConnector};
pub use config::{
    GEMINI_INPUT_MIME_TYPE, GEMINI_INPUT_SAMPLE_RATE, GEMINI_LIVE_URL, GEMINI_OUTPUT_SAMPLE_RATE,
    GeminiLiveConfig, GeminiLiveModel, GeminiVoice,
};
