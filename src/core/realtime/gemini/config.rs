//! Gemini Live API configuration types.
//!
//! This module contains:
//! - Endpoint and audio format constants
//! - Model selection
//! - Prebuilt voice selection
//! - Connector configuration

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::realtime::base::{RealtimeError, RealtimeResult};

/// Gemini Live BidiGenerateContent WebSocket endpoint.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Sample rate the service expects for realtime input.
pub const GEMINI_INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of the audio the service returns.
pub const GEMINI_OUTPUT_SAMPLE_RATE: u32 = 24000;

/// MIME type attached to every outbound audio chunk.
pub const GEMINI_INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

// =============================================================================
// Models
// =============================================================================

/// Supported Gemini Live models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiLiveModel {
    /// Native audio dialog preview (September 2025)
    #[default]
    #[serde(rename = "gemini-2.5-flash-native-audio-preview-09-2025")]
    Flash25NativeAudioPreview092025,
    /// Gemini Live 2.5 Flash preview (half-cascade)
    #[serde(rename = "gemini-live-2.5-flash-preview")]
    Live25FlashPreview,
    /// Gemini 2.0 Flash Live
    #[serde(rename = "gemini-2.0-flash-live-001")]
    Flash20Live001,
}

impl GeminiLiveModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash25NativeAudioPreview092025 => "gemini-2.5-flash-native-audio-preview-09-2025",
            Self::Live25FlashPreview => "gemini-live-2.5-flash-preview",
            Self::Flash20Live001 => "gemini-2.0-flash-live-001",
        }
    }

    /// Parse from string, with fallback to default. A `models/` prefix is
    /// accepted.
    pub fn from_str_or_default(s: &str) -> Self {
        let s = s.trim().to_lowercase();
        match s.strip_prefix("models/").unwrap_or(s.as_str()) {
            "gemini-2.5-flash-native-audio-preview-09-2025" => {
                Self::Flash25NativeAudioPreview092025
            }
            "gemini-live-2.5-flash-preview" => Self::Live25FlashPreview,
            "gemini-2.0-flash-live-001" => Self::Flash20Live001,
            _ => Self::default(),
        }
    }

    /// Resource name used in the setup message.
    pub fn resource_name(&self) -> String {
        format!("models/{}", self.as_str())
    }
}

impl std::fmt::Display for GeminiLiveModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices available to Live models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeminiVoice {
    Puck,
    Charon,
    /// Kore voice (default)
    #[default]
    Kore,
    Fenrir,
    Aoede,
    Leda,
    Orus,
    Zephyr,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Zephyr => "Zephyr",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "puck" => Self::Puck,
            "charon" => Self::Charon,
            "kore" => Self::Kore,
            "fenrir" => Self::Fenrir,
            "aoede" => Self::Aoede,
            "leda" => Self::Leda,
            "orus" => Self::Orus,
            "zephyr" => Self::Zephyr,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Connector Configuration
// =============================================================================

/// Transport settings for [`super::GeminiLiveConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiLiveConfig {
    pub api_key: String,
    /// WebSocket endpoint; overridable for proxies and tests.
    pub endpoint: String,
}

impl GeminiLiveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: GEMINI_LIVE_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Endpoint URL with the API key attached as the `key` query parameter.
    pub fn build_ws_url(&self) -> RealtimeResult<Url> {
        if self.api_key.trim().is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("endpoint: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "endpoint must use ws or wss, got {}",
                url.scheme()
            )));
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}
