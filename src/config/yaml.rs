use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// gemini:
///   api_key: "your-gemini-key"
///   model: "gemini-2.5-flash-native-audio-preview-09-2025"
///   voice: "Kore"
///   endpoint: "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent"
///
/// audio:
///   capture_sample_rate: 16000
///   playback_sample_rate: 24000
///   frame_size: 2048
///   noise_threshold: 0.01
///
/// session:
///   settle_delay_ms: 200
///   end_call_delay_ms: 4000
///   instructions_path: "/etc/receptionist/instructions.md"
///
/// booking:
///   webhook_url: "https://script.example.com/bookings"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub gemini: Option<GeminiYaml>,
    pub audio: Option<AudioYaml>,
    pub session: Option<SessionYaml>,
    pub booking: Option<BookingYaml>,
}

/// Gemini Live settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeminiYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub endpoint: Option<String>,
}

/// Audio pipeline settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub capture_sample_rate: Option<u32>,
    pub playback_sample_rate: Option<u32>,
    /// Samples per capture tick
    pub frame_size: Option<usize>,
    /// RMS below which capture frames are zeroed
    pub noise_threshold: Option<f32>,
}

/// Session timing from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub settle_delay_ms: Option<u64>,
    pub end_call_delay_ms: Option<u64>,
    /// File whose contents replace the built-in behavioral script
    pub instructions_path: Option<String>,
}

/// Booking sink settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BookingYaml {
    pub webhook_url: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Load(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::Load(format!("Failed to parse YAML config: {e}")))?;

        Ok(config)
    }
}
