//! Interprets tool invocations issued by the model.

use std::sync::Arc;

use serde_json::json;

use super::appointment::AppointmentData;
use super::declarations::{BOOK_APPOINTMENT, BOOKING_SAVED_RESULT, CALL_ENDED_RESULT, END_CALL};
use super::sink::BookingSink;
use crate::core::realtime::{FunctionCall, FunctionResponse};

/// What the session should do after a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Send the acknowledgement.
    Respond(FunctionResponse),
    /// Send the acknowledgement, then schedule the deferred disconnect.
    EndCall(FunctionResponse),
    /// Unknown tool; nothing is sent.
    Ignored,
}

impl ToolOutcome {
    pub fn response(&self) -> Option<&FunctionResponse> {
        match self {
            Self::Respond(r) | Self::EndCall(r) => Some(r),
            Self::Ignored => None,
        }
    }
}

/// Routes `bookAppointment` and `endCall`.
#[derive(Clone)]
pub struct ToolDispatcher {
    sink: Arc<dyn BookingSink>,
}

impl ToolDispatcher {
    pub fn new(sink: Arc<dyn BookingSink>) -> Self {
        Self { sink }
    }

    /// Handle one invocation.
    ///
    /// Bookings are handed to the sink on a detached task, so this never
    /// waits on delivery. Must be called from within a tokio runtime.
    pub fn dispatch(&self, call: &FunctionCall) -> ToolOutcome {
        match call.name.as_str() {
            BOOK_APPOINTMENT => {
                let payload = match AppointmentData::from_args(&call.args) {
                    Ok(booking) => {
                        tracing::info!(call_id = %call.id, name = %booking.name, "Booking received");
                        let sink = self.sink.clone();
                        tokio::spawn(async move {
                            if let Err(e) = sink.submit(booking).await {
                                tracing::warn!("Failed to hand off booking: {}", e);
                            }
                        });
                        json!({ "result": BOOKING_SAVED_RESULT })
                    }
                    Err(e) => {
                        tracing::warn!(call_id = %call.id, "Rejected booking arguments: {}", e);
                        json!({ "error": e.to_string() })
                    }
                };
                ToolOutcome::Respond(respond(call, payload))
            }
            END_CALL => {
                tracing::info!(call_id = %call.id, "Model requested end of call");
                ToolOutcome::EndCall(respond(call, json!({ "result": CALL_ENDED_RESULT })))
            }
            other => {
                tracing::warn!(call_id = %call.id, tool = other, "Ignoring unknown tool invocation");
                ToolOutcome::Ignored
            }
        }
    }
}

fn respond(call: &FunctionCall, response: serde_json::Value) -> FunctionResponse {
    FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response,
    }
}
