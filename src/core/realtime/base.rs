//! Base traits and types for live conversational channels.
//!
//! A live channel is a bidirectional message stream to a hosted speech model.
//! The session manager depends only on the provider-neutral vocabulary in this
//! module:
//!
//! - [`RealtimeConnector`] performs the handshake and returns a channel plus
//!   the receiver on which [`ChannelEvent`]s arrive.
//! - [`RealtimeChannel`] accepts outbound [`ClientMessage`]s without blocking.
//!
//! # Audio Format
//!
//! Input audio is PCM 16-bit signed little-endian at 16kHz, output audio is the
//! same encoding at 24kHz. Both travel as base64 text.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Substrings of error messages that mark teardown races or transient network
/// noise rather than a real session failure.
pub const BENIGN_ERROR_MARKERS: &[&str] = &["cancelled", "closed", "Network error", "aborted"];

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// The channel was closed locally or by the provider
    #[error("Channel closed")]
    ChannelClosed,

    /// Outbound queue is full
    #[error("Send queue full")]
    Backpressure,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RealtimeError {
    /// Whether this error belongs to the benign category that is swallowed
    /// instead of surfaced.
    pub fn is_benign(&self) -> bool {
        let message = self.to_string();
        BENIGN_ERROR_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No session
    #[default]
    Disconnected,
    /// Resources are being acquired or the handshake is in flight
    Connecting,
    /// Channel open, audio flowing
    Connected,
    /// Unrecoverable failure; `connect` may be called again
    Error,
}

impl ConnectionState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error => write!(f, "Error"),
        }
    }
}

// =============================================================================
// Session Setup
// =============================================================================

/// Output modality requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Audio,
    Text,
}

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema-like parameter object; absent for tools without arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Everything sent to the provider when the channel opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSetup {
    pub model: String,
    pub voice: String,
    pub instructions: String,
    pub tools: Vec<FunctionDeclaration>,
    pub response_modalities: Vec<Modality>,
}

// =============================================================================
// Messages
// =============================================================================

/// A tool invocation issued by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Acknowledgement of a [`FunctionCall`], matched by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub id: String,
    pub name: String,
    pub response: serde_json::Value,
}

/// Outbound message vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// One encoded capture frame.
    RealtimeAudio { mime_type: String, data: String },
    /// A complete user text turn.
    Text { text: String },
    /// Acknowledgements for tool invocations.
    ToolResponse { responses: Vec<FunctionResponse> },
}

/// One inbound message, normalized.
///
/// A single provider frame can carry several of these parts at once; they are
/// processed in field order: tool calls, audio, then interruption.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub tool_calls: Vec<FunctionCall>,
    /// Base64 PCM16 payloads at the playback rate.
    pub audio: Vec<String>,
    pub interrupted: bool,
    pub turn_complete: bool,
    /// Ids of tool calls the provider withdrew.
    pub cancelled_tool_calls: Vec<String>,
    /// The provider announced it will close the connection soon.
    pub go_away: bool,
}

impl ServerMessage {
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty()
            && self.audio.is_empty()
            && !self.interrupted
            && !self.turn_complete
            && self.cancelled_tool_calls.is_empty()
            && !self.go_away
    }
}

/// Asynchronous events delivered by an open channel.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Setup acknowledged; the channel accepts input.
    Open,
    Message(ServerMessage),
    Close { reason: Option<String> },
    Error(RealtimeError),
}

// =============================================================================
// Channel Traits
// =============================================================================

/// Handle to an open channel.
///
/// Sends are non-blocking so they can be issued from audio and timer tasks.
pub trait RealtimeChannel: Send + Sync {
    fn send(&self, message: ClientMessage) -> RealtimeResult<()>;

    /// Close the channel. Idempotent; later sends fail.
    fn close(&self) -> RealtimeResult<()>;

    fn is_open(&self) -> bool;
}

/// Shared channel handle.
pub type BoxedChannel = Arc<dyn RealtimeChannel>;

/// Performs the provider handshake.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    /// Open a channel configured with `setup`.
    ///
    /// Returns once the transport is established; [`ChannelEvent::Open`]
    /// follows on the receiver when the provider accepts the setup.
    async fn open(
        &self,
        setup: SessionSetup,
    ) -> RealtimeResult<(BoxedChannel, mpsc::Receiver<ChannelEvent>)>;

    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;
}
