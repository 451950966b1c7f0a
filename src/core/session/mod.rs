//! Realtime audio session management.
//!
//! # Architecture
//!
//! ```text
//! connect() ──► capture ctx ──► playback ctx ──► microphone ──► handshake
//!                                                                  │
//!        ┌─────────────── ChannelEvent receiver ◄──────────────────┘
//!        ▼
//!   run_events ── Open ──► capture loop ──► RealtimeAudio frames
//!        │                 trigger (settle delay) ──► "start_conversation"
//!        ├── Message ──► ToolDispatcher ──► ToolResponse (+ deferred endCall)
//!        │           └─► PlaybackScheduler (audio, interruption)
//!        ├── Close ──► teardown
//!        └── Error ──► benign? swallow : Error state
//! ```

mod config;
mod manager;
mod observer;
mod resources;
mod token;

pub use config::{DEFAULT_END_CALL_DELAY_MS, DEFAULT_SETTLE_DELAY_MS, SessionConfig};
pub use manager::{
    CONNECTION_ERROR_MESSAGE, HANDSHAKE_FAILED_MESSAGE, SETUP_FAILED_MESSAGE, SessionError,
    SessionManager, SessionResult,
};
pub use observer::{ChannelObserver, NoopObserver, SessionEvent, SessionObserver};
pub use resources::SessionResources;
pub use token::ConnectionToken;
