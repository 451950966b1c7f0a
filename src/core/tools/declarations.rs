//! Tool vocabulary declared to the model at session setup.

use once_cell::sync::Lazy;
use serde_json::json;

use crate::core::realtime::FunctionDeclaration;

pub const BOOK_APPOINTMENT: &str = "bookAppointment";
pub const END_CALL: &str = "endCall";

/// Result string acknowledged after a booking is handed to the sink.
pub const BOOKING_SAVED_RESULT: &str = "Success. Appointment saved to database.";

/// Result string acknowledged for `endCall`.
pub const CALL_ENDED_RESULT: &str = "Call ended";

static BOOK_APPOINTMENT_DECLARATION: Lazy<FunctionDeclaration> = Lazy::new(|| FunctionDeclaration {
    name: BOOK_APPOINTMENT.to_string(),
    description: "Saves the appointment details to the clinic database after user confirmation."
        .to_string(),
    parameters: Some(json!({
        "type": "OBJECT",
        "properties": {
            "name": {"type": "STRING", "description": "Patient's full name"},
            "age": {"type": "NUMBER", "description": "Patient's age"},
            "gender": {
                "type": "STRING",
                "description": "Patient's gender",
                "enum": ["Male", "Female", "Other"]
            },
            "mobile": {"type": "STRING", "description": "Patient's 10-digit mobile number"},
            "visitType": {
                "type": "STRING",
                "description": "Either 'First Visit' or 'Follow-up'",
                "enum": ["First Visit", "Follow-up"]
            },
            "concern": {"type": "STRING", "description": "Brief description of the issue"},
            "appointmentDate": {
                "type": "STRING",
                "description": "Date of appointment (DD-MM-YYYY format preferred)"
            },
            "appointmentTime": {"type": "STRING", "description": "Time of appointment"},
            "fee": {"type": "NUMBER", "description": "Consultation fee if discussed"},
            "language": {
                "type": "STRING",
                "description": "Language used primarily in conversation"
            }
        },
        "required": [
            "name", "age", "gender", "mobile", "visitType",
            "concern", "appointmentDate", "appointmentTime"
        ]
    })),
});

static END_CALL_DECLARATION: Lazy<FunctionDeclaration> = Lazy::new(|| FunctionDeclaration {
    name: END_CALL.to_string(),
    description: "Ends the voice call session when the user has no further questions and the conversation is finished."
        .to_string(),
    parameters: None,
});

/// Both tools, in declaration order.
pub fn tool_declarations() -> Vec<FunctionDeclaration> {
    vec![
        BOOK_APPOINTMENT_DECLARATION.clone(),
        END_CALL_DECLARATION.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_names() {
        let names: Vec<_> = tool_declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![BOOK_APPOINTMENT, END_CALL]);
    }

    #[test]
    fn test_booking_schema_required_fields() {
        let params = BOOK_APPOINTMENT_DECLARATION.parameters.as_ref().unwrap();
        let required: Vec<&str> = params["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        assert_eq!(required.len(), 8);
        assert!(required.contains(&"gender"));
        assert!(!required.contains(&"fee"));
        assert_eq!(
            params["properties"]["visitType"]["enum"],
            json!(["First Visit", "Follow-up"])
        );
    }

    #[test]
    fn test_end_call_has_no_parameters() {
        assert!(END_CALL_DECLARATION.parameters.is_none());
        let value = serde_json::to_value(&*END_CALL_DECLARATION).unwrap();
        assert!(value.get("parameters").is_none());
    }
}
