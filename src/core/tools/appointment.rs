//! Appointment record produced by the booking tool.

use serde::{Deserialize, Deserializer, Serialize};

use super::ToolError;
use super::declarations::BOOK_APPOINTMENT;

/// Kind of visit being booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitType {
    #[serde(rename = "First Visit", alias = "First visit", alias = "first visit")]
    FirstVisit,
    #[serde(
        rename = "Follow-up",
        alias = "Follow-Up",
        alias = "follow-up",
        alias = "Follow up",
        alias = "follow up"
    )]
    FollowUp,
}

impl VisitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstVisit => "First Visit",
            Self::FollowUp => "Follow-up",
        }
    }
}

impl std::fmt::Display for VisitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "male")]
    Male,
    #[serde(alias = "female")]
    Female,
    #[serde(alias = "other")]
    Other,
}

/// A confirmed booking, as collected by the receptionist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentData {
    pub name: String,
    #[serde(deserialize_with = "lenient_age")]
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(deserialize_with = "string_or_number")]
    pub mobile: String,
    pub visit_type: VisitType,
    pub concern: String,
    pub appointment_date: String,
    pub appointment_time: String,
    /// Consultation fee in rupees; zero when it was never discussed.
    #[serde(default)]
    pub fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AppointmentData {
    /// Build a record from tool-call arguments.
    pub fn from_args(args: &serde_json::Value) -> Result<Self, ToolError> {
        Self::deserialize(args).map_err(|e| ToolError::InvalidArguments {
            tool: BOOK_APPOINTMENT.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Accept `30`, `30.0`, `"30"` or `30.4`; fractions round to the nearest year.
fn lenient_age<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value.map(f64::round) {
        Some(v) if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(serde::de::Error::custom(
            "expected a non-negative number or numeric string",
        )),
    }
}

/// Phone numbers are declared as strings but sometimes arrive as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asha() -> serde_json::Value {
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

    #[test]
    fn test_from_args_full_record() {
        let data = AppointmentData::from_args(&asha()).unwrap();

        assert_eq!(data.name, "Asha");
        assert_eq!(data.age, 30);
        assert_eq!(data.mobile, "9998887776");
        assert_eq!(data.visit_type, VisitType::FirstVisit);
        assert_eq!(data.concern, "sleep issues");
        assert_eq!(data.appointment_date, "12-05-2025");
        assert_eq!(data.appointment_time, "10:30");
        assert_eq!(data.fee, 700.0);
        assert!(data.gender.is_none());
        assert!(data.language.is_none());
        assert!(data.follow_up_interval.is_none());
    }

    #[test]
    fn test_optional_fields() {
        let mut args = asha();
        args["gender"] = json!("Female");
        args["language"] = json!("Odia");
        args["followUpInterval"] = json!("2 weeks");
        args["visitType"] = json!("Follow-up");

        let data = AppointmentData::from_args(&args).unwrap();

        assert_eq!(data.gender, Some(Gender::Female));
        assert_eq!(data.language.as_deref(), Some("Odia"));
        assert_eq!(data.follow_up_interval.as_deref(), Some("2 weeks"));
        assert_eq!(data.visit_type, VisitType::FollowUp);
    }

    #[test]
    fn test_lenient_numbers() {
        let mut args = asha();
        args["age"] = json!(42.0);
        args["mobile"] = json!(9998887776u64);
        args.as_object_mut().unwrap().remove("fee");

        let data = AppointmentData::from_args(&args).unwrap();

        assert_eq!(data.age, 42);
        assert_eq!(data.mobile, "9998887776");
        assert_eq!(data.fee, 0.0);
    }

    #[test]
    fn test_age_as_string_or_fraction() {
        let mut args = asha();
        args["age"] = json!("30");
        assert_eq!(AppointmentData::from_args(&args).unwrap().age, 30);

        args["age"] = json!(" 41 ");
        assert_eq!(AppointmentData::from_args(&args).unwrap().age, 41);

        args["age"] = json!(30.4);
        assert_eq!(AppointmentData::from_args(&args).unwrap().age, 30);

        args["age"] = json!(30.5);
        assert_eq!(AppointmentData::from_args(&args).unwrap().age, 31);
    }

    #[test]
    fn test_unusable_age_is_rejected() {
        let mut args = asha();
        for age in [json!(-3), json!("thirty"), json!(null), json!([30])] {
            args["age"] = age;
            let err = AppointmentData::from_args(&args).unwrap_err();
            assert!(err.to_string().contains("non-negative number"));
        }
    }

    #[test]
    fn test_missing_required_field() {
        let mut args = asha();
        args.as_object_mut().unwrap().remove("appointmentTime");

        let err = AppointmentData::from_args(&args).unwrap_err();
        assert!(err.to_string().contains("appointmentTime"));
        assert!(err.to_string().contains(BOOK_APPOINTMENT));
    }

    #[test]
    fn test_unknown_visit_type_is_rejected() {
        let mut args = asha();
        args["visitType"] = json!("Emergency");
        assert!(AppointmentData::from_args(&args).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let data = AppointmentData::from_args(&asha()).unwrap();
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["visitType"], "First Visit");
        assert_eq!(value["appointmentDate"], "12-05-2025");
        assert!(value.get("gender").is_none());
    }
}
