//! Gemini Live WebSocket message types.
//!
//! Every frame is a JSON object with exactly one top-level key naming the
//! message kind.
//!
//! Client messages (sent to server):
//! - setup - model, generation config, system instruction and tools; first frame only
//! - realtimeInput - streamed microphone audio
//! - clientContent - complete text turns
//! - toolResponse - results for tool calls
//!
//! Server messages (received from server):
//! - setupComplete - setup accepted, input may flow
//! - serverContent - model audio, interruption and turn boundaries
//! - toolCall - function calls issued by the model
//! - toolCallCancellation - previously issued calls withdrawn
//! - goAway - the server will disconnect soon

use serde::{Deserialize, Serialize};

use crate::core::realtime::base::{
    ClientMessage, FunctionCall, FunctionDeclaration, FunctionResponse, Modality, ServerMessage,
    SessionSetup,
};

// =============================================================================
// Shared Content Types
// =============================================================================

/// Inline binary data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

/// One part of a content turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

/// A content turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

// =============================================================================
// Client Messages
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Body of the `setup` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl Setup {
    pub fn from_session(setup: &SessionSetup) -> Self {
        let model = setup.model.trim();
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };

        Self {
            model,
            generation_config: GenerationConfig {
                response_modalities: setup.response_modalities.clone(),
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: setup.voice.clone(),
                        },
                    },
                },
            },
            system_instruction: (!setup.instructions.trim().is_empty()).then(|| Content {
                role: None,
                parts: vec![Part::text(setup.instructions.clone())],
            }),
            tools: if setup.tools.is_empty() {
                Vec::new()
            } else {
                vec![Tool {
                    function_declarations: setup.tools.clone(),
                }]
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    pub media_chunks: Vec<Blob>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub function_responses: Vec<FunctionResponse>,
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientEvent {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
    ClientContent(ClientContent),
    ToolResponse(ToolResponse),
}

impl From<ClientMessage> for ClientEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::RealtimeAudio { mime_type, data } => {
                ClientEvent::RealtimeInput(RealtimeInput {
                    media_chunks: vec![Blob { mime_type, data }],
                })
            }
            ClientMessage::Text { text } => ClientEvent::ClientContent(ClientContent {
                turns: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part::text(text)],
                }],
                turn_complete: true,
            }),
            ClientMessage::ToolResponse { responses } => ClientEvent::ToolResponse(ToolResponse {
                function_responses: responses,
            }),
        }
    }
}

// =============================================================================
// Server Messages
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub generation_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallCancellation {
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    #[serde(default)]
    pub time_left: Option<String>,
}

/// Inbound frame. Fields are independent and may co-occur.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
    #[serde(default)]
    pub tool_call_cancellation: Option<ToolCallCancellation>,
    #[serde(default)]
    pub go_away: Option<GoAway>,
}

impl ServerEvent {
    pub fn is_setup_complete(&self) -> bool {
        self.setup_complete.is_some()
    }

    /// Normalize into the provider-neutral message. Audio is taken from every
    /// inline part whose MIME type is audio (or unspecified).
    pub fn into_server_message(self) -> ServerMessage {
        let mut message = ServerMessage::default();

        if let Some(tool_call) = self.tool_call {
            message.tool_calls = tool_call.function_calls;
        }

        if let Some(content) = self.server_content {
            if let Some(turn) = content.model_turn {
                message.audio = turn
                    .parts
                    .into_iter()
                    .filter_map(|part| part.inline_data)
                    .filter(|blob| blob.mime_type.is_empty() || blob.mime_type.starts_with("audio/"))
                    .map(|blob| blob.data)
                    .collect();
            }
            message.interrupted = content.interrupted;
            message.turn_complete = content.turn_complete;
        }

        if let Some(cancellation) = self.tool_call_cancellation {
            message.cancelled_tool_calls = cancellation.ids;
        }

        message.go_away = self.go_away.is_some();
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_setup() -> SessionSetup {
        SessionSetup {
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Kore".to_string(),
            instructions: "Be kind.".to_string(),
            tools: vec![FunctionDeclaration {
                name: "endCall".to_string(),
                description: "Ends the call".to_string(),
                parameters: None,
            }],
            response_modalities: vec![Modality::Audio],
        }
    }

    #[test]
    fn test_setup_serialization() {
        let event = ClientEvent::Setup(Setup::from_session(&session_setup()));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "setup": {
                    "model": "models/gemini-2.5-flash-native-audio-preview-09-2025",
                    "generationConfig": {
                        "responseModalities": ["AUDIO"],
                        "speechConfig": {
                            "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}
                        }
                    },
                    "systemInstruction": {"parts": [{"text": "Be kind."}]},
                    "tools": [{"functionDeclarations": [
                        {"name": "endCall", "description": "Ends the call"}
                    ]}]
                }
            })
        );
    }

    #[test]
    fn test_setup_keeps_existing_models_prefix() {
        let mut setup = session_setup();
        setup.model = "models/custom".to_string();
        setup.instructions = String::new();
        setup.tools.clear();

        let value = serde_json::to_value(Setup::from_session(&setup)).unwrap();

        assert_eq!(value["model"], "models/custom");
        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_realtime_audio_serialization() {
        let event: ClientEvent = ClientMessage::RealtimeAudio {
            mime_type: "audio/pcm;rate=16000".to_string(),
            data: "AAA=".to_string(),
        }
        .into();

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"realtimeInput": {"mediaChunks": [
                {"mimeType": "audio/pcm;rate=16000", "data": "AAA="}
            ]}})
        );
    }

    #[test]
    fn test_text_turn_serialization() {
        let event: ClientEvent = ClientMessage::Text {
            text: "start_conversation".to_string(),
        }
        .into();

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"clientContent": {
                "turns": [{"role": "user", "parts": [{"text": "start_conversation"}]}],
                "turnComplete": true
            }})
        );
    }

    #[test]
    fn test_tool_response_serialization() {
        let event: ClientEvent = ClientMessage::ToolResponse {
            responses: vec![FunctionResponse {
                id: "call-1".to_string(),
                name: "endCall".to_string(),
                response: json!({"result": "Call ended"}),
            }],
        }
        .into();

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"toolResponse": {"functionResponses": [
                {"id": "call-1", "name": "endCall", "response": {"result": "Call ended"}}
            ]}})
        );
    }

    #[test]
    fn test_parse_setup_complete() {
        let event: ServerEvent = serde_json::from_str(r#"{"setupComplete": {}}"#).unwrap();
        assert!(event.is_setup_complete());
        assert!(event.into_server_message().is_empty());
    }

    #[test]
    fn test_parse_model_audio() {
        let event: ServerEvent = serde_json::from_value(json!({
            "serverContent": {"modelTurn": {"parts": [
                {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAAA"}},
                {"text": "thinking"},
                {"inlineData": {"mimeType": "image/png", "data": "XXXX"}}
            ]}}
        }))
        .unwrap();

        let message = event.into_server_message();
        assert_eq!(message.audio, vec!["AAAA".to_string()]);
        assert!(!message.interrupted);
    }

    #[test]
    fn test_parse_interrupted_and_turn_complete() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"serverContent": {"interrupted": true, "turnComplete": true}}"#)
                .unwrap();
        let message = event.into_server_message();
        assert!(message.interrupted);
        assert!(message.turn_complete);
    }

    #[test]
    fn test_parse_tool_call() {
        let event: ServerEvent = serde_json::from_value(json!({
            "toolCall": {"functionCalls": [
                {"id": "fc-1", "name": "bookAppointment", "args": {"name": "Asha"}},
                {"id": "fc-2", "name": "endCall"}
            ]}
        }))
        .unwrap();

        let message = event.into_server_message();
        assert_eq!(message.tool_calls.len(), 2);
        assert_eq!(message.tool_calls[0].args["name"], "Asha");
        assert_eq!(message.tool_calls[1].name, "endCall");
    }

    #[test]
    fn test_parse_cancellation_and_go_away() {
        let event: ServerEvent = serde_json::from_value(json!({
            "toolCallCancellation": {"ids": ["fc-9"]},
            "goAway": {"timeLeft": "10s"}
        }))
        .unwrap();

        let message = event.into_server_message();
        assert_eq!(message.cancelled_tool_calls, vec!["fc-9".to_string()]);
        assert!(message.go_away);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"usageMetadata": {"totalTokenCount": 5}}"#).unwrap();
        assert!(event.into_server_message().is_empty());
    }
}
