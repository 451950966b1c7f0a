//! In-memory fakes for the session's collaborators.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use receptionist_live::core::audio::{
    AudioBackend, AudioContext, AudioError, AudioResult, CaptureConstraints, MediaTrack,
    MicrophoneStream, PlaybackContext, Timeline,
};
use receptionist_live::core::realtime::{
    BoxedChannel, ChannelEvent, ClientMessage, FunctionResponse, RealtimeChannel,
    RealtimeConnector, RealtimeError, RealtimeResult, SessionSetup,
};

// =============================================================================
// Audio
// =============================================================================

pub struct FakeContext {
    rate: u32,
    closed: AtomicBool,
}

impl FakeContext {
    fn new(rate: u32) -> Self {
        Self {
            rate,
            closed: AtomicBool::new(false),
        }
    }
}

impl AudioContext for FakeContext {
    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn close(&self) -> AudioResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(AudioError::ContextClosed);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeTrack {
    live: AtomicBool,
}

impl MediaTrack for FakeTrack {
    fn label(&self) -> &str {
        "fake microphone"
    }

    fn stop(&self) -> AudioResult<()> {
        self.live.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Audio resources handed out for one session, in acquisition order.
pub struct FakeAudioSession {
    pub capture: Arc<FakeContext>,
    pub playback: Option<Timeline>,
    pub track: Option<Arc<FakeTrack>>,
    pub microphone: Option<mpsc::Sender<Vec<f32>>>,
}

impl FakeAudioSession {
    /// Whether any resource of this session is still held.
    pub fn is_live(&self) -> bool {
        !self.capture.is_closed()
            || self.playback.as_ref().is_some_and(|t| !t.is_closed())
            || self.track.as_ref().is_some_and(|t| t.is_live())
    }

    pub fn timeline(&self) -> &Timeline {
        self.playback.as_ref().expect("playback context not opened")
    }
}

#[derive(Default)]
pub struct FakeAudioBackend {
    pub sessions: Mutex<Vec<FakeAudioSession>>,
    pub deny_microphone: AtomicBool,
    pub fail_capture_context: AtomicBool,
    pub constraints: Mutex<Vec<CaptureConstraints>>,
}

impl FakeAudioBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.lock().iter().filter(|s| s.is_live()).count()
    }

    pub fn with_session<T>(&self, index: usize, f: impl FnOnce(&FakeAudioSession) -> T) -> T {
        f(&self.sessions.lock()[index])
    }

    /// Sender feeding the microphone of session `index`.
    pub fn microphone(&self, index: usize) -> mpsc::Sender<Vec<f32>> {
        self.sessions.lock()[index]
            .microphone
            .clone()
            .expect("microphone not opened")
    }

    /// Push a microphone chunk into session `index`.
    pub async fn speak(&self, index: usize, chunk: Vec<f32>) {
        let sender = self.sessions.lock()[index]
            .microphone
            .clone()
            .expect("microphone not opened");
        sender.send(chunk).await.expect("capture loop gone");
    }
}

#[async_trait]
impl AudioBackend for FakeAudioBackend {
    async fn open_capture_context(&self, sample_rate: u32) -> AudioResult<Arc<dyn AudioContext>> {
        if self.fail_capture_context.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceUnavailable("no input device".to_string()));
        }
        let context = Arc::new(FakeContext::new(sample_rate));
        self.sessions.lock().push(FakeAudioSession {
            capture: context.clone(),
            playback: None,
            track: None,
            microphone: None,
        });
        Ok(context)
    }

    async fn open_playback_context(
        &self,
        sample_rate: u32,
    ) -> AudioResult<Arc<dyn PlaybackContext>> {
        let timeline = Timeline::new(sample_rate);
        if let Some(session) = self.sessions.lock().last_mut() {
            session.playback = Some(timeline.clone());
        }
        Ok(Arc::new(timeline))
    }

    async fn open_microphone(
        &self,
        constraints: &CaptureConstraints,
    ) -> AudioResult<MicrophoneStream> {
        self.constraints.lock().push(*constraints);
        if self.deny_microphone.load(Ordering::SeqCst) {
            return Err(AudioError::PermissionDenied("user dismissed prompt".to_string()));
        }
        let track = Arc::new(FakeTrack {
            live: AtomicBool::new(true),
        });
        let (tx, rx) = mpsc::channel(64);
        if let Some(session) = self.sessions.lock().last_mut() {
            session.track = Some(track.clone());
            session.microphone = Some(tx);
        }
        Ok(MicrophoneStream {
            tracks: vec![track],
            samples: rx,
        })
    }
}

// =============================================================================
// Realtime channel
// =============================================================================

#[derive(Default)]
pub struct FakeChannel {
    pub sent: Mutex<Vec<ClientMessage>>,
    closed: AtomicBool,
}

impl FakeChannel {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn tool_responses(&self) -> Vec<FunctionResponse> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| match m {
                ClientMessage::ToolResponse { responses } => Some(responses.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Audio frames as (mime type, payload).
    pub fn audio_frames(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| match m {
                ClientMessage::RealtimeAudio { mime_type, data } => {
                    Some((mime_type.clone(), data.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

impl RealtimeChannel for FakeChannel {
    fn send(&self, message: ClientMessage) -> RealtimeResult<()> {
        if self.is_closed() {
            return Err(RealtimeError::ChannelClosed);
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn close(&self) -> RealtimeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.is_closed()
    }
}

/// One `open` call, registered before the handshake resolves.
#[derive(Clone)]
pub struct FakeSession {
    pub setup: SessionSetup,
    pub channel: Arc<FakeChannel>,
    pub events: mpsc::Sender<ChannelEvent>,
}

impl FakeSession {
    /// Deliver an event; returns false if the session stopped listening.
    pub async fn emit(&self, event: ChannelEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub sessions: Mutex<Vec<FakeSession>>,
    pub reject: AtomicBool,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next handshake wait until the returned sender fires.
    pub fn hold_next_handshake(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }

    pub fn session(&self, index: usize) -> FakeSession {
        self.sessions.lock()[index].clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[async_trait]
impl RealtimeConnector for FakeConnector {
    async fn open(
        &self,
        setup: SessionSetup,
    ) -> RealtimeResult<(BoxedChannel, mpsc::Receiver<ChannelEvent>)> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(RealtimeError::AuthenticationFailed("HTTP 401".to_string()));
        }

        let channel = Arc::new(FakeChannel::default());
        let (tx, rx) = mpsc::channel(64);
        self.sessions.lock().push(FakeSession {
            setup,
            channel: channel.clone(),
            events: tx,
        });

        let gate = self.gates.lock().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        Ok((channel, rx))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
