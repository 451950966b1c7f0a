//! Configuration module for the receptionist agent
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use receptionist_live::config::AgentConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = AgentConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = AgentConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Using model {}", config.model);
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::audio::{
    CAPTURE_SAMPLE_RATE, DEFAULT_FRAME_SIZE, DEFAULT_NOISE_THRESHOLD, PLAYBACK_SAMPLE_RATE,
};
use crate::core::realtime::{GEMINI_LIVE_URL, GeminiLiveConfig, GeminiLiveModel, GeminiVoice};
use crate::core::session::{DEFAULT_END_CALL_DELAY_MS, DEFAULT_SETTLE_DELAY_MS, SessionConfig};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML file could not be read or parsed
    #[error("{0}")]
    Load(String),

    /// An environment variable holds a value of the wrong type
    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv { name: String, reason: String },

    /// The merged configuration is not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The instruction file could not be read
    #[error("Failed to read instructions file {path}: {source}")]
    Instructions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Agent configuration
///
/// Contains everything needed to run a receptionist session:
/// - Gemini Live credentials, model, voice and endpoint
/// - Audio pipeline rates, frame size and noise gate threshold
/// - Session timing and the behavioral script override
/// - Booking webhook
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    // Gemini Live
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub endpoint: String,

    // Audio pipeline
    pub capture_sample_rate: u32,
    pub playback_sample_rate: u32,
    pub frame_size: usize,
    pub noise_threshold: f32,

    // Session timing
    pub settle_delay_ms: u64,
    pub end_call_delay_ms: u64,
    /// Replaces the built-in behavioral script when set
    pub instructions_path: Option<PathBuf>,

    // Booking sink
    pub booking_webhook_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: GeminiLiveModel::default().as_str().to_string(),
            voice: GeminiVoice::default().as_str().to_string(),
            endpoint: GEMINI_LIVE_URL.to_string(),
            capture_sample_rate: CAPTURE_SAMPLE_RATE,
            playback_sample_rate: PLAYBACK_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            end_call_delay_ms: DEFAULT_END_CALL_DELAY_MS,
            instructions_path: None,
            booking_webhook_url: None,
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in main.rs at startup, so its values are
    /// already visible here as environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::merge(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = Self::merge(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn merge(yaml: Option<YamlConfig>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Environment
        if let Some(key) = env_string("GEMINI_API_KEY").or_else(|| env_string("API_KEY")) {
            config.api_key = key;
        }
        if let Some(model) = env_string("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(voice) = env_string("GEMINI_VOICE") {
            config.voice = voice;
        }
        if let Some(endpoint) = env_string("GEMINI_LIVE_URL") {
            config.endpoint = endpoint;
        }
        if let Some(frame_size) = env_parse("CAPTURE_FRAME_SIZE")? {
            config.frame_size = frame_size;
        }
        if let Some(threshold) = env_parse("NOISE_THRESHOLD")? {
            config.noise_threshold = threshold;
        }
        if let Some(path) = env_string("INSTRUCTIONS_PATH") {
            config.instructions_path = Some(PathBuf::from(path));
        }
        if let Some(url) = env_string("BOOKING_WEBHOOK_URL") {
            config.booking_webhook_url = Some(url);
        }

        // YAML overrides
        let Some(yaml) = yaml else {
            return Ok(config);
        };

        if let Some(gemini) = yaml.gemini {
            config.api_key = gemini.api_key.unwrap_or(config.api_key);
            config.model = gemini.model.unwrap_or(config.model);
            config.voice = gemini.voice.unwrap_or(config.voice);
            config.endpoint = gemini.endpoint.unwrap_or(config.endpoint);
        }
        if let Some(audio) = yaml.audio {
            config.capture_sample_rate = audio
                .capture_sample_rate
                .unwrap_or(config.capture_sample_rate);
            config.playback_sample_rate = audio
                .playback_sample_rate
                .unwrap_or(config.playback_sample_rate);
            config.frame_size = audio.frame_size.unwrap_or(config.frame_size);
            config.noise_threshold = audio.noise_threshold.unwrap_or(config.noise_threshold);
        }
        if let Some(session) = yaml.session {
            config.settle_delay_ms = session.settle_delay_ms.unwrap_or(config.settle_delay_ms);
            config.end_call_delay_ms = session
                .end_call_delay_ms
                .unwrap_or(config.end_call_delay_ms);
            if let Some(path) = session.instructions_path {
                config.instructions_path = Some(PathBuf::from(path));
            }
        }
        if let Some(booking) = yaml.booking
            && let Some(url) = booking.webhook_url
        {
            config.booking_webhook_url = Some(url);
        }

        Ok(config)
    }

    /// Check the merged configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_api_key(&self.api_key)?;
        validation::validate_sample_rates(self.capture_sample_rate, self.playback_sample_rate)?;
        validation::validate_frame_size(self.frame_size)?;
        validation::validate_noise_threshold(self.noise_threshold)?;
        if let Some(url) = &self.booking_webhook_url {
            validation::validate_webhook_url(url)?;
        }
        Ok(())
    }

    /// Connector settings for Gemini Live
    pub fn gemini_config(&self) -> GeminiLiveConfig {
        GeminiLiveConfig::new(self.api_key.clone()).with_endpoint(self.endpoint.clone())
    }

    /// Session settings, reading the instruction override if one is configured
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let mut session = SessionConfig {
            capture_sample_rate: self.capture_sample_rate,
            playback_sample_rate: self.playback_sample_rate,
            frame_size: self.frame_size,
            noise_threshold: self.noise_threshold,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            end_call_delay: Duration::from_millis(self.end_call_delay_ms),
            ..SessionConfig::default()
        };
        session.setup.model = self.model.clone();
        session.setup.voice = GeminiVoice::from_str_or_default(&self.voice)
            .as_str()
            .to_string();

        if let Some(path) = &self.instructions_path {
            let text = std::fs::read_to_string(path).map_err(|source| {
                ConfigError::Instructions {
                    path: path.clone(),
                    source,
                }
            })?;
            session.setup.instructions = text.trim().to_string();
        }

        Ok(session)
    }

    /// Parsed booking webhook, if configured
    pub fn booking_webhook(&self) -> Option<Url> {
        self.booking_webhook_url
            .as_deref()
            .and_then(|url| Url::parse(url).ok())
    }
}

/// Non-empty environment variable
fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidEnv {
                name: name.to_string(),
                reason: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
