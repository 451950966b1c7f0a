pub mod audio;
pub mod realtime;
pub mod session;
pub mod tools;

// Re-export commonly used types for convenience
pub use audio::{AudioBackend, AudioError, AudioResult, PlaybackScheduler, Timeline};

pub use realtime::{
    ChannelEvent, ClientMessage, ConnectionState, GeminiLiveConfig, GeminiLiveConnector,
    RealtimeConnector, RealtimeError, RealtimeResult, ServerMessage, SessionSetup,
    create_realtime_connector, get_supported_realtime_providers,
};

pub use session::{
    ChannelObserver, SessionConfig, SessionError, SessionEvent, SessionManager, SessionObserver,
};

pub use tools::{AppointmentData, BookingSink, ToolDispatcher, ToolError};
