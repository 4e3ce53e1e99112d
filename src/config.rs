use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub assistant: AssistantConfig,
    pub transcription: TranscriptionConfig,
    pub telephony: TelephonyConfig,
    pub roster: RosterConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Trigger word that must prefix a transcript for it to be a command
    #[serde(default = "default_wake_word")]
    pub wake_word: String,

    /// Display name the assistant announces itself with to the provider
    pub speaker_name: String,

    /// Provider-side user id for the assistant (an email works)
    pub speaker_id: String,

    /// Meeting title sent in the recognition start request
    #[serde(default = "default_meeting_title")]
    pub meeting_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Provider API base URL, e.g. "https://api.symbl.ai/"
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,

    /// Telephony audio is narrowband PCM
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelephonyConfig {
    /// REST API base URL of the call-control platform
    pub base_url: String,
    pub account_sid: String,
    pub api_key: String,

    /// Number outbound SMS invitations are sent from
    pub sms_from: String,
}

#[derive(Debug, Deserialize)]
pub struct RosterConfig {
    /// Path to the roster snapshot (JSON). May be absent; the assistant
    /// then runs with an empty member directory.
    pub path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CONCIERGE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn default_wake_word() -> String {
    "Xfinity".to_string()
}

fn default_meeting_title() -> String {
    "Conference call".to_string()
}

fn default_sample_rate() -> u32 {
    8000
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.5
}
