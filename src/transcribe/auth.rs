use crate::config::TranscriptionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// Exchange application credentials for a short-lived access token.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    config: &TranscriptionConfig,
) -> Result<String, TokenError> {
    let url = format!(
        "{}/oauth2/token:generate",
        config.base_url.trim_end_matches('/')
    );

    let request = TokenRequest {
        kind: "application",
        app_id: &config.app_id,
        app_secret: &config.app_secret,
    };

    let response = http.post(&url).json(&request).send().await?;
    if !response.status().is_success() {
        return Err(TokenError::Status(response.status()));
    }

    let token: TokenResponse = response.json().await?;
    debug!("Obtained transcription access token");
    Ok(token.access_token)
}
