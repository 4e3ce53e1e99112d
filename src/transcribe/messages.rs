//! Provider wire protocol
//!
//! Outbound: `start_request` (declares insight types, the roster vocabulary
//! tracker and the recognition config) and `stop_request`. Inbound messages
//! are classified into [`ProviderEvent`]s; anything unrecognized is ignored
//! and malformed payloads surface as [`ParseError`] so the link can log and
//! drop them without dying.

use crate::config::{AssistantConfig, TranscriptionConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid provider JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed recognition result: {0}")]
    Malformed(&'static str),
}

// ============================================================================
// Outbound control messages
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ControlRequest {
    #[serde(rename = "start_request")]
    Start(StartRequest),

    #[serde(rename = "stop_request")]
    Stop,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub insight_types: Vec<&'static str>,
    pub trackers: Tracker,
    pub config: RecognitionConfig,
    pub speaker: Speaker,
}

/// Vocabulary hint set; seeding it with roster names biases the recognizer
/// toward hearing member names correctly.
#[derive(Debug, Serialize)]
pub struct Tracker {
    pub name: String,
    pub vocabulary: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub confidence_threshold: f64,

    /// Offset from UTC in minutes
    pub timezone_offset: i32,

    pub language_code: String,
    pub speech_recognition: SpeechRecognition,
    pub meeting_title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognition {
    pub encoding: &'static str,
    pub sample_rate_hertz: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub user_id: String,
    pub name: String,
}

impl ControlRequest {
    pub fn start(
        transcription: &TranscriptionConfig,
        assistant: &AssistantConfig,
        vocabulary: Vec<String>,
    ) -> Self {
        let offset_minutes = chrono::Local::now().offset().local_minus_utc() / 60;

        ControlRequest::Start(StartRequest {
            insight_types: vec!["question", "action_item"],
            trackers: Tracker {
                name: "Roster".to_string(),
                vocabulary,
            },
            config: RecognitionConfig {
                confidence_threshold: transcription.confidence_threshold,
                timezone_offset: offset_minutes,
                language_code: transcription.language_code.clone(),
                speech_recognition: SpeechRecognition {
                    encoding: "LINEAR16",
                    sample_rate_hertz: transcription.sample_rate,
                },
                meeting_title: assistant.meeting_title.clone(),
            },
            speaker: Speaker {
                user_id: assistant.speaker_id.clone(),
                name: assistant.speaker_name.clone(),
            },
        })
    }
}

// ============================================================================
// Inbound message classification
// ============================================================================

/// What an inbound provider message means to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Stable transcript, ready for command parsing
    FinalTranscript(String),

    /// Conversation insight text (surfaced in logs only)
    Insight(String),

    /// Interim hypothesis or a message kind we don't act on
    Ignored,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    messages: Vec<InsightMessage>,
}

#[derive(Debug, Deserialize)]
struct InsightMessage {
    payload: InsightPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightPayload {
    content_type: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognitionEnvelope {
    message: RecognitionMessage,
}

#[derive(Debug, Deserialize)]
struct RecognitionMessage {
    #[serde(rename = "type")]
    kind: String,

    #[serde(rename = "isFinal", default)]
    is_final: bool,

    payload: Option<RecognitionPayload>,
}

#[derive(Debug, Deserialize)]
struct RecognitionPayload {
    raw: RawRecognition,
}

#[derive(Debug, Deserialize)]
struct RawRecognition {
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    transcript: String,
}

/// Classify a raw provider payload.
pub fn classify(raw: &str) -> Result<ProviderEvent, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .map(str::to_string);

    match kind.as_deref() {
        Some("message_response") => {
            let response: InsightResponse = serde_json::from_value(value)?;
            let text = response
                .messages
                .iter()
                .filter(|m| m.payload.content_type == "text/plain")
                .map(|m| m.payload.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(ProviderEvent::Insight(text))
        }
        Some("message") => {
            let envelope: RecognitionEnvelope = serde_json::from_value(value)?;
            let message = envelope.message;
            if message.kind != "recognition_result" || !message.is_final {
                return Ok(ProviderEvent::Ignored);
            }

            let payload = message
                .payload
                .ok_or(ParseError::Malformed("final result without payload"))?;
            let transcript = payload
                .raw
                .alternatives
                .into_iter()
                .next()
                .ok_or(ParseError::Malformed("final result without alternatives"))?
                .transcript;
            Ok(ProviderEvent::FinalTranscript(transcript))
        }
        _ => Ok(ProviderEvent::Ignored),
    }
}
