//! Tool invocation fixtures

use serde_json::{Value, json};

use receptionist_live::core::realtime::FunctionCall;
use receptionist_live::core::tools::{AppointmentData, BOOK_APPOINTMENT, END_CALL, VisitType};

/// Arguments of the reference booking
pub fn asha_args() -> Value {
    json!({
        "name": "Asha",
        "age": 30,
        "mobile": "9998887776",
        "visitType": "First Visit",
        "concern": "sleep issues",
        "appointmentDate": "12-05-2025",
        "appointmentTime": "10:30",
        "fee": 700
    })
}

/// The record the reference booking must produce
pub fn asha_record() -> AppointmentData {
    AppointmentData {
        name: "Asha".to_string(),
        age: 30,
        gender: None,
        mobile: "9998887776".to_string(),
        visit_type: VisitType::FirstVisit,
        concern: "sleep issues".to_string(),
        appointment_date: "12-05-2025".to_string(),
        appointment_time: "10:30".to_string(),
        fee: 700.0,
        follow_up_interval: None,
        language: None,
    }
}

pub fn booking_call(id: &str) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: BOOK_APPOINTMENT.to_string(),
        args: asha_args(),
    }
}

pub fn end_call(id: &str) -> FunctionCall {
    FunctionCall {
        id: id.to_string(),
        name: END_CALL.to_string(),
        args: json!({}),
    }
}
