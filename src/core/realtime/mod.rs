//! Realtime conversational channel module.
//!
//! This module provides the provider-neutral channel abstraction used by the
//! session manager and its Gemini Live implementation.
//!
//! # Supported Providers
//!
//! - **Gemini Live** - Native audio dialog over BidiGenerateContent
//!
//! # Architecture
//!
//! - `RealtimeConnector` performs the handshake and yields a channel plus an
//!   event receiver
//! - `RealtimeChannel` queues outbound messages without blocking
//! - Factory function for creating a connector by provider name
//!
//! # Example
//!
//! ```rust,ignore
//! use receptionist_live::core::realtime::{create_realtime_connector, GeminiLiveConfig};
//!
//! let connector = create_realtime_connector("gemini", GeminiLiveConfig::new("api-key"))?;
//! let (channel, mut events) = connector.open(setup).await?;
//! ```

mod base;
pub mod gemini;

use std::sync::Arc;

pub use base::{
    BENIGN_ERROR_MARKERS, BoxedChannel, ChannelEvent, ClientMessage, ConnectionState,
    FunctionCall, FunctionDeclaration, FunctionResponse, Modality, RealtimeChannel,
    RealtimeConnector, RealtimeError, RealtimeResult, ServerMessage, SessionSetup,
};
pub use gemini::{
    GEMINI_INPUT_MIME_TYPE, GEMINI_INPUT_SAMPLE_RATE, GEMINI_LIVE_URL, GEMINI_OUTPUT_SAMPLE_RATE,
    GeminiLiveChannel, GeminiLiveConfig, GeminiLiveConnector, GeminiLiveModel, GeminiVoice,
};

/// Supported realtime providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeProvider {
    /// Google Gemini Live API
    Gemini,
}

impl RealtimeProvider {
    /// Parse provider from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "gemini-live" | "gemini_live" | "google" => Some(RealtimeProvider::Gemini),
            _ => None,
        }
    }
}

impl std::fmt::Display for RealtimeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RealtimeProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Factory function to create a connector by provider name.
pub fn create_realtime_connector(
    provider_type: &str,
    config: GeminiLiveConfig,
) -> RealtimeResult<Arc<dyn RealtimeConnector>> {
    match RealtimeProvider::parse(provider_type) {
        Some(RealtimeProvider::Gemini) => Ok(Arc::new(GeminiLiveConnector::new(config))),
        None => Err(RealtimeError::InvalidConfiguration(format!(
            "Unsupported realtime provider '{}'. Supported: {}",
            provider_type,
            get_supported_realtime_providers().join(", ")
        ))),
    }
}

/// Get list of supported realtime providers.
pub fn get_supported_realtime_providers() -> Vec<&'static str> {
    vec!["gemini"]
}
