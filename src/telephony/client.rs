use crate::config::TelephonyConfig;
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telephony API returned {0}")]
    Status(reqwest::StatusCode),
}

/// Outbound side effects against the call
#[async_trait]
pub trait CallControl: Send + Sync {
    /// Speak text into the live call identified by `call_id`
    async fn say(&self, call_id: &str, text: &str) -> Result<(), SendError>;

    /// Send an SMS from the configured sending number
    async fn send_sms(&self, to: &str, text: &str) -> Result<(), SendError>;
}

/// REST client against the telephony platform's account API
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    api_key: String,
    sms_from: String,
}

impl RestClient {
    pub fn new(config: &TelephonyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            api_key: config.api_key.clone(),
            sms_from: config.sms_from.clone(),
        }
    }
}

#[async_trait]
impl CallControl for RestClient {
    async fn say(&self, call_id: &str, text: &str) -> Result<(), SendError> {
        let url = format!(
            "{}/v1/Accounts/{}/Calls/{}",
            self.base_url, self.account_sid, call_id
        );
        let body = json!({
            "whisper": { "verb": "say", "text": text }
        });

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SendError::Status(response.status()));
        }

        debug!("Spoke into call {}: {}", call_id, text);
        Ok(())
    }

    async fn send_sms(&self, to: &str, text: &str) -> Result<(), SendError> {
        let url = format!("{}/v1/Accounts/{}/Messages", self.base_url, self.account_sid);
        let body = json!({
            "from": self.sms_from,
            "to": to,
            "text": text,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SendError::Status(response.status()));
        }

        debug!("Sent SMS to {}", to);
        Ok(())
    }
}
