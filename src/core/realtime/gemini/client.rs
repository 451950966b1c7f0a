//! Gemini Live API client implementation.
//!
//! This module provides the connector that implements [`RealtimeConnector`]
//! on top of Gemini's BidiGenerateContent WebSocket.
//!
//! # API Reference
//!
//! - Endpoint: `wss://generativelanguage.googleapis.com/ws/...BidiGenerateContent?key=<key>`
//! - Protocol: WebSocket with JSON messages (text or binary frames)
//! - Audio in: PCM 16-bit, 16kHz, mono, little-endian, base64 encoded
//! - Audio out: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded
//!
//! # Example
//!
//! ```rust,ignore
//! use receptionist_live::core::realtime::{GeminiLiveConfig, GeminiLiveConnector, RealtimeConnector};
//!
//! let connector = GeminiLiveConnector::new(GeminiLiveConfig::new("api-key"));
//! let (channel, mut events) = connector.open(setup).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::GeminiLiveConfig;
use super::messages::{ClientEvent, ServerEvent, Setup};
use crate::core::realtime::base::{
    BoxedChannel, ChannelEvent, ClientMessage, RealtimeChannel, RealtimeConnector, RealtimeError,
    RealtimeResult, SessionSetup,
};

/// Channel capacity for WebSocket message sending.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Channel capacity for inbound events awaiting dispatch.
const EVENT_CHANNEL_CAPACITY: usize = 256;

enum Outgoing {
    Event(Box<ClientEvent>),
    Close,
}

// =============================================================================
// Channel
// =============================================================================

/// Sending half of an open Gemini Live connection.
///
/// Messages are queued to the connection task; `send` never blocks.
pub struct GeminiLiveChannel {
    sender: mpsc::Sender<Outgoing>,
    open: Arc<AtomicBool>,
}

impl RealtimeChannel for GeminiLiveChannel {
    fn send(&self, message: ClientMessage) -> RealtimeResult<()> {
        if !self.open.load(Ordering::Acquire) {
            return Err(RealtimeError::ChannelClosed);
        }
        self.sender
            .try_send(Outgoing::Event(Box::new(message.into())))
            .map_err(|e| match e {
                TrySendError::Full(_) => RealtimeError::Backpressure,
                TrySendError::Closed(_) => RealtimeError::ChannelClosed,
            })
    }

    fn close(&self) -> RealtimeResult<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            tracing::debug!("Closing Gemini Live channel");
            // A full queue still ends the task once the sender is dropped.
            let _ = self.sender.try_send(Outgoing::Close);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Opens Gemini Live sessions.
#[derive(Debug, Clone)]
pub struct GeminiLiveConnector {
    config: GeminiLiveConfig,
}

impl GeminiLiveConnector {
    pub fn new(config: GeminiLiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeminiLiveConfig {
        &self.config
    }
}

fn map_handshake_error(error: tungstenite::Error) -> RealtimeError {
    match &error {
        tungstenite::Error::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            RealtimeError::AuthenticationFailed(format!("HTTP {}", response.status()))
        }
        _ => RealtimeError::ConnectionFailed(error.to_string()),
    }
}

#[async_trait]
impl RealtimeConnector for GeminiLiveConnector {
    async fn open(
        &self,
        setup: SessionSetup,
    ) -> RealtimeResult<(BoxedChannel, mpsc::Receiver<ChannelEvent>)> {
        let url = self.config.build_ws_url()?;

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(map_handshake_error)?;

        tracing::info!(model = %setup.model, voice = %setup.voice, "Connected to Gemini Live");

        let (mut ws_sink, ws_stream) = ws_stream.split();

        // Setup must be the first frame on the socket.
        let setup_json = serde_json::to_string(&ClientEvent::Setup(Setup::from_session(&setup)))
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;
        ws_sink
            .send(Message::Text(setup_json.into()))
            .await
            .map_err(|e| RealtimeError::WebSocketError(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<Outgoing>(WS_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<ChannelEvent>(EVENT_CHANNEL_CAPACITY);
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(run_connection(ws_sink, ws_stream, rx, event_tx, open.clone()));

        let channel: BoxedChannel = Arc::new(GeminiLiveChannel { sender: tx, open });
        Ok((channel, event_rx))
    }

    fn provider_name(&self) -> &'static str {
        "gemini-live"
    }
}

// =============================================================================
// Connection Task
// =============================================================================

/// Decode one JSON payload into an event, if it carries anything.
fn parse_payload(payload: &[u8]) -> Option<ChannelEvent> {
    match serde_json::from_slice::<ServerEvent>(payload) {
        Ok(event) if event.is_setup_complete() => Some(ChannelEvent::Open),
        Ok(event) => {
            let message = event.into_server_message();
            (!message.is_empty()).then_some(ChannelEvent::Message(message))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse Gemini Live message: {} - {}",
                e,
                String::from_utf8_lossy(payload)
            );
            None
        }
    }
}

async fn run_connection<S, R>(
    mut ws_sink: S,
    mut ws_stream: R,
    mut rx: mpsc::Receiver<Outgoing>,
    event_tx: mpsc::Sender<ChannelEvent>,
    open: Arc<AtomicBool>,
) where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin + Send,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send,
{
    loop {
        tokio::select! {
            // Handle outgoing messages
            outgoing = rx.recv() => match outgoing {
                Some(Outgoing::Event(event)) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                        tracing::error!("Failed to send WebSocket message: {}", e);
                        let _ = event_tx
                            .send(ChannelEvent::Error(RealtimeError::WebSocketError(e.to_string())))
                            .await;
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = ws_sink.send(Message::Close(None)).await;
                    let _ = ws_sink.close().await;
                    let _ = event_tx
                        .send(ChannelEvent::Close { reason: Some("closed locally".to_string()) })
                        .await;
                    break;
                }
            },

            // Handle incoming messages
            incoming = ws_stream.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => parse_payload(text.as_bytes()),
                    Some(Ok(Message::Binary(data))) => {
                        if data.first() == Some(&b'{') {
                            parse_payload(&data)
                        } else {
                            tracing::debug!(bytes = data.len(), "Ignoring non-JSON binary frame");
                            None
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                            tracing::error!("Failed to send pong: {}", e);
                        }
                        None
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty());
                        tracing::info!(reason = ?reason, "WebSocket closed by server");
                        let _ = event_tx.send(ChannelEvent::Close { reason }).await;
                        break;
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        let _ = event_tx
                            .send(ChannelEvent::Error(RealtimeError::WebSocketError(e.to_string())))
                            .await;
                        let _ = event_tx.send(ChannelEvent::Close { reason: None }).await;
                        break;
                    }
                    None => {
                        let _ = event_tx.send(ChannelEvent::Close { reason: None }).await;
                        break;
                    }
                };

                if let Some(event) = event
                    && event_tx.send(event).await.is_err()
                {
                    tracing::debug!("Event receiver dropped; closing Gemini Live connection");
                    let _ = ws_sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    open.store(false, Ordering::Release);
}
