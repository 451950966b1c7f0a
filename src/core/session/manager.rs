//! Session lifecycle manager.
//!
//! Owns the connect/disconnect state machine and routes channel events to the
//! tool dispatcher and the playback scheduler.
//!
//! # Token discipline
//!
//! `connect` and `disconnect` both advance the [`ConnectionToken`]. Every
//! suspension point inside `connect`, and every spawned continuation (event
//! loop, capture loop, conversation trigger, deferred end-call), captures the
//! token it was started under and re-checks it before touching shared state.
//! Work from a superseded session is dropped and anything it acquired after
//! being superseded is released on the spot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;

use super::config::SessionConfig;
use super::observer::SessionObserver;
use super::resources::SessionResources;
use super::token::ConnectionToken;
use crate::core::audio::{
    AudioBackend, AudioContext, AudioError, CaptureConstraints, CapturePipeline, MicrophoneStream,
    PlaybackScheduler,
};
use crate::core::realtime::{
    BoxedChannel, ChannelEvent, ClientMessage, ConnectionState, RealtimeConnector, RealtimeError,
    ServerMessage,
};
use crate::core::tools::{START_CONVERSATION_TRIGGER, ToolDispatcher, ToolOutcome};

/// Shown when audio setup fails.
pub const SETUP_FAILED_MESSAGE: &str = "Failed to initialize connection.";

/// Shown when the handshake is rejected.
pub const HANDSHAKE_FAILED_MESSAGE: &str = "Unable to connect. Please check your network or API key.";

/// Shown for unclassified runtime errors.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

/// Errors returned from [`SessionManager::connect`].
///
/// The observer has already been told about the failure by the time one of
/// these is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Audio setup failed: {0}")]
    Audio(#[from] AudioError),

    #[error("Channel handshake failed: {0}")]
    Handshake(#[from] RealtimeError),

    /// A later `connect` or `disconnect` took over while this one was
    /// in flight.
    #[error("Connection attempt superseded")]
    Superseded,
}

pub type SessionResult<T> = Result<T, SessionError>;

struct SessionInner {
    config: SessionConfig,
    backend: Arc<dyn AudioBackend>,
    connector: Arc<dyn RealtimeConnector>,
    observer: Arc<dyn SessionObserver>,
    dispatcher: ToolDispatcher,
    token: ConnectionToken,
    connected: AtomicBool,
    state: RwLock<ConnectionState>,
    error: RwLock<Option<String>>,
    /// `f32` bits of the last volume reading.
    volume: AtomicU32,
    /// Orders volume publications so a reset to idle is never overtaken.
    volume_order: Mutex<()>,
    resources: Mutex<Option<SessionResources>>,
}

/// Drives one voice session at a time.
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn AudioBackend>,
        connector: Arc<dyn RealtimeConnector>,
        observer: Arc<dyn SessionObserver>,
        dispatcher: ToolDispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                backend,
                connector,
                observer,
                dispatcher,
                token: ConnectionToken::new(),
                connected: AtomicBool::new(false),
                state: RwLock::new(ConnectionState::Disconnected),
                error: RwLock::new(None),
                volume: AtomicU32::new(0.0f32.to_bits()),
                volume_order: Mutex::new(()),
                resources: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// User-facing error message, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.error.read().clone()
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.inner.volume.load(Ordering::Relaxed))
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Current connection token.
    pub fn token(&self) -> u64 {
        self.inner.token.current()
    }

    /// Token of the live session record, if one exists.
    pub fn active_session(&self) -> Option<u64> {
        self.inner.resources.lock().as_ref().map(|r| r.token)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Start a new session, tearing down any existing one first.
    ///
    /// Returns once the handshake completes; `Connected` follows when the
    /// provider acknowledges the setup. Failures are reported to the observer
    /// and returned. A hung handshake stays in `Connecting` until
    /// [`disconnect`](Self::disconnect) or another `connect` supersedes it.
    pub async fn connect(&self) -> SessionResult<()> {
        let inner = &self.inner;

        let token = inner.begin_session();
        inner.set_volume(0.0);
        inner.set_error(None);
        inner.set_state(ConnectionState::Connecting);
        tracing::info!(token, provider = inner.connector.provider_name(), "Connecting");

        if let Err(e) = inner.acquire_audio(token).await {
            if !matches!(e, SessionError::Superseded) && inner.token.is_current(token) {
                tracing::error!(token, "Audio setup failed: {}", e);
                inner.teardown();
                inner.set_volume(0.0);
                inner.set_error(Some(SETUP_FAILED_MESSAGE));
                inner.set_state(ConnectionState::Error);
            }
            return Err(e);
        }

        let (channel, events) = match inner.connector.open(inner.config.setup.clone()).await {
            Ok(opened) => opened,
            Err(e) => {
                if !inner.token.is_current(token) {
                    return Err(SessionError::Superseded);
                }
                tracing::error!(token, "Handshake failed: {}", e);
                inner.teardown();
                inner.set_volume(0.0);
                inner.set_error(Some(HANDSHAKE_FAILED_MESSAGE));
                inner.set_state(ConnectionState::Error);
                return Err(e.into());
            }
        };

        let event_inner = inner.clone();
        let attached = inner.attach(token, |record| {
            record.channel = Some(channel.clone());
            record
                .tasks
                .push(tokio::spawn(event_inner.run_events(token, events)));
        });
        if !attached {
            tracing::debug!(token, "Handshake finished after supersession, closing channel");
            let _ = channel.close();
            return Err(SessionError::Superseded);
        }

        Ok(())
    }

    /// Tear down the current session, if any. Idempotent.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl SessionInner {
    // =========================================================================
    // Shared state
    // =========================================================================

    fn set_state(&self, state: ConnectionState) {
        {
            let mut current = self.state.write();
            if *current == state {
                return;
            }
            *current = state;
        }
        tracing::info!(state = %state, "Session state changed");
        self.observer.on_state_change(state);
    }

    fn set_error(&self, message: Option<&str>) {
        {
            let mut current = self.error.write();
            if current.as_deref() == message {
                return;
            }
            *current = message.map(str::to_string);
        }
        self.observer.on_error(message);
    }

    fn set_volume(&self, volume: f32) {
        let _order = self.volume_order.lock();
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
        self.observer.on_volume(volume);
    }

    /// Publish a capture reading unless `token` lost the session.
    ///
    /// Teardown advances the token before the reset to zero, so a reading
    /// that passes the check here is always followed by that reset.
    fn publish_volume(&self, token: u64, volume: f32) -> bool {
        let _order = self.volume_order.lock();
        if !self.is_live(token) {
            return false;
        }
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
        self.observer.on_volume(volume);
        true
    }

    /// Whether `token` still owns the session and the channel is open.
    fn is_live(&self, token: u64) -> bool {
        self.token.is_current(token) && self.connected.load(Ordering::SeqCst)
    }

    /// Run `f` on the live record if it still belongs to `token`.
    ///
    /// Returns `false` when superseded; the caller then releases whatever it
    /// was about to attach.
    fn attach(&self, token: u64, f: impl FnOnce(&mut SessionResources)) -> bool {
        let mut resources = self.resources.lock();
        match resources.as_mut() {
            Some(record) if record.token == token && self.token.is_current(token) => {
                f(record);
                true
            }
            _ => false,
        }
    }

    fn channel(&self, token: u64) -> Option<BoxedChannel> {
        self.resources
            .lock()
            .as_ref()
            .filter(|r| r.token == token)
            .and_then(|r| r.channel.clone())
    }

    fn playback(&self, token: u64) -> Option<PlaybackScheduler> {
        self.resources
            .lock()
            .as_ref()
            .filter(|r| r.token == token)
            .and_then(|r| r.playback.clone())
    }

    fn send(&self, token: u64, message: ClientMessage) {
        let Some(channel) = self.channel(token) else {
            return;
        };
        if let Err(e) = channel.send(message) {
            tracing::debug!(token, "Dropped outbound message: {}", e);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    async fn acquire_audio(&self, token: u64) -> SessionResult<()> {
        let config = &self.config;

        let capture = self
            .backend
            .open_capture_context(config.capture_sample_rate)
            .await?;
        if !self.attach(token, |r| r.capture_context = Some(capture.clone())) {
            let _ = capture.close();
            return Err(SessionError::Superseded);
        }

        let playback = self
            .backend
            .open_playback_context(config.playback_sample_rate)
            .await?;
        let scheduler = PlaybackScheduler::new(playback.clone());
        if !self.attach(token, |r| r.playback = Some(scheduler)) {
            let _ = playback.close();
            return Err(SessionError::Superseded);
        }

        let constraints = CaptureConstraints::speech(config.capture_sample_rate);
        let MicrophoneStream { tracks, samples } =
            self.backend.open_microphone(&constraints).await?;
        let attached = self.attach(token, |r| {
            r.microphone_tracks = tracks.clone();
            r.microphone_samples = Some(samples);
        });
        if !attached {
            MicrophoneStream::stop_tracks(&tracks);
            return Err(SessionError::Superseded);
        }

        tracing::debug!(token, tracks = tracks.len(), "Audio resources acquired");
        Ok(())
    }

    /// Invalidate the token and release the live record without touching the
    /// reported state.
    /// Supersede the current session and install an empty record for a new
    /// one. The token advance and the install share one critical section so
    /// concurrent connects cannot interleave them.
    fn begin_session(&self) -> u64 {
        self.connected.store(false, Ordering::SeqCst);
        let (token, previous) = {
            let mut resources = self.resources.lock();
            let token = self.token.advance();
            (token, resources.replace(SessionResources::new(token)))
        };
        if let Some(record) = previous {
            record.release();
        }
        token
    }

    fn teardown(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let record = {
            let mut resources = self.resources.lock();
            self.token.advance();
            resources.take()
        };
        if let Some(record) = record {
            record.release();
        }
    }

    fn disconnect(&self) {
        self.teardown();
        self.set_volume(0.0);
        self.set_state(ConnectionState::Disconnected);
    }

    // =========================================================================
    // Channel events
    // =========================================================================

    async fn run_events(self: Arc<Self>, token: u64, mut events: mpsc::Receiver<ChannelEvent>) {
        while let Some(event) = events.recv().await {
            if !self.token.is_current(token) {
                tracing::debug!(token, "Dropping event from superseded session");
                break;
            }
            match event {
                ChannelEvent::Open => self.on_open(token),
                ChannelEvent::Message(message) => {
                    if self.connected.load(Ordering::SeqCst) {
                        self.on_message(token, message);
                    }
                }
                ChannelEvent::Close { reason } => {
                    self.on_close(token, reason);
                    break;
                }
                ChannelEvent::Error(e) => self.on_error(token, e),
            }
        }
    }

    fn on_open(self: &Arc<Self>, token: u64) {
        self.connected.store(true, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);
        tracing::info!(token, "Channel open");

        let capture_inner = self.clone();
        let trigger_inner = self.clone();
        let started = self.attach(token, |record| {
            if let Some(samples) = record.microphone_samples.take() {
                record
                    .tasks
                    .push(tokio::spawn(capture_inner.run_capture(token, samples)));
            }
            record
                .tasks
                .push(tokio::spawn(trigger_inner.send_trigger(token)));
        });
        if !started {
            tracing::debug!(token, "Session superseded before capture started");
        }
    }

    async fn run_capture(self: Arc<Self>, token: u64, mut samples: mpsc::Receiver<Vec<f32>>) {
        let mut pipeline =
            CapturePipeline::new(self.config.frame_size, self.config.noise_threshold);
        let mime_type = self.config.input_mime_type();

        'capture: while let Some(chunk) = samples.recv().await {
            for frame in pipeline.push(&chunk) {
                if !self.publish_volume(token, frame.volume) {
                    break 'capture;
                }
                self.send(
                    token,
                    ClientMessage::RealtimeAudio {
                        mime_type: mime_type.clone(),
                        data: frame.payload,
                    },
                );
            }
        }
        tracing::debug!(token, "Capture loop finished");
    }

    async fn send_trigger(self: Arc<Self>, token: u64) {
        tokio::time::sleep(self.config.settle_delay).await;
        if self.is_live(token) {
            tracing::debug!(token, "Sending conversation trigger");
            self.send(
                token,
                ClientMessage::Text {
                    text: START_CONVERSATION_TRIGGER.to_string(),
                },
            );
        }
    }

    fn on_message(self: &Arc<Self>, token: u64, message: ServerMessage) {
        for call in &message.tool_calls {
            let outcome = self.dispatcher.dispatch(call);
            if let Some(response) = outcome.response() {
                self.send(
                    token,
                    ClientMessage::ToolResponse {
                        responses: vec![response.clone()],
                    },
                );
            }
            if let ToolOutcome::EndCall(_) = outcome {
                self.schedule_end_call(token);
            }
        }

        if !message.cancelled_tool_calls.is_empty() {
            tracing::info!(token, ids = ?message.cancelled_tool_calls, "Tool calls cancelled by provider");
        }

        if !message.audio.is_empty()
            && let Some(playback) = self.playback(token)
        {
            for payload in &message.audio {
                if let Err(e) = playback.schedule_payload(payload) {
                    tracing::warn!(token, bytes = payload.len(), "Dropping audio payload: {}", e);
                }
            }
        }

        if message.interrupted
            && let Some(playback) = self.playback(token)
        {
            let stopped = playback.interrupt();
            tracing::debug!(token, stopped, "Playback interrupted");
        }

        if message.go_away {
            tracing::info!(token, "Provider announced imminent disconnect");
        }
    }

    fn schedule_end_call(self: &Arc<Self>, token: u64) {
        let inner = self.clone();
        let delay = self.config.end_call_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.token.is_current(token) {
                tracing::info!(token, "Ending call");
                inner.disconnect();
            }
        });
    }

    fn on_close(&self, token: u64, reason: Option<String>) {
        tracing::info!(token, reason = reason.as_deref().unwrap_or(""), "Channel closed");
        self.teardown();
        self.set_volume(0.0);
        self.set_state(ConnectionState::Disconnected);
    }

    fn on_error(&self, token: u64, error: RealtimeError) {
        if error.is_benign() {
            tracing::debug!(token, "Ignoring benign channel error: {}", error);
            return;
        }
        tracing::error!(token, "Channel error: {}", error);
        self.connected.store(false, Ordering::SeqCst);
        self.set_error(Some(CONNECTION_ERROR_MESSAGE));
        self.set_state(ConnectionState::Error);
    }
}
