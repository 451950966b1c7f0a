//! Remote-invoked commands: booking and call termination.
//!
//! - `declarations` holds the tool vocabulary sent in the session setup
//! - `dispatcher` turns invocations into acknowledgements and side effects
//! - `sink` receives confirmed bookings
//! - `prompt` holds the default behavioral script

pub mod appointment;
pub mod declarations;
pub mod dispatcher;
pub mod prompt;
pub mod sink;

use thiserror::Error;

pub use appointment::{AppointmentData, Gender, VisitType};
pub use declarations::{
    BOOK_APPOINTMENT, BOOKING_SAVED_RESULT, CALL_ENDED_RESULT, END_CALL, tool_declarations,
};
pub use dispatcher::{ToolDispatcher, ToolOutcome};
pub use prompt::{START_CONVERSATION_TRIGGER, SYSTEM_INSTRUCTION};
pub use sink::{BookingSink, FanoutBookingSink, LoggingBookingSink, WebhookBookingSink};

/// Errors raised while handling a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Booking sink failed: {0}")]
    SinkFailed(String),
}
