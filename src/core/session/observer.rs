//! UI-facing notifications.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::realtime::ConnectionState;
use crate::core::tools::{AppointmentData, BookingSink, ToolError};

/// Receives everything a status display needs.
///
/// Called synchronously from session tasks; implementations must not block.
pub trait SessionObserver: Send + Sync {
    /// Called only when the state actually changes.
    fn on_state_change(&self, state: ConnectionState);

    /// Called once per capture tick with a value in `[0, 1]`, and with zero on
    /// teardown. Readings are delivered in order under a session lock, so
    /// implementations must not call `connect` or `disconnect` from here.
    fn on_volume(&self, _volume: f32) {}

    /// Called when the user-facing error message is set or cleared.
    fn on_error(&self, _message: Option<&str>) {}
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_state_change(&self, _state: ConnectionState) {}
}

/// Event forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    State(ConnectionState),
    Volume(f32),
    Error(Option<String>),
    Booking(AppointmentData),
}

/// Forwards session notifications and bookings over an unbounded channel.
///
/// Doubles as a [`BookingSink`] so a UI can receive state and bookings from a
/// single stream.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn emit(&self, event: SessionEvent) {
        // Receiver gone means nobody is watching.
        let _ = self.sender.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_state_change(&self, state: ConnectionState) {
        self.emit(SessionEvent::State(state));
    }

    fn on_volume(&self, volume: f32) {
        self.emit(SessionEvent::Volume(volume));
    }

    fn on_error(&self, message: Option<&str>) {
        self.emit(SessionEvent::Error(message.map(str::to_string)));
    }
}

#[async_trait]
impl BookingSink for ChannelObserver {
    async fn submit(&self, booking: AppointmentData) -> Result<(), ToolError> {
        self.sender
            .send(SessionEvent::Booking(booking))
            .map_err(|_| ToolError::SinkFailed("observer channel closed".to_string()))
    }
}
