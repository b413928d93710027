use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, trace};

use crate::protocol::{CommandRequest, CommandResponse, SvenState, COMMAND_PATH, STATE_PATH};
use crate::transport::{ClientConfig, ClientError};

/// HTTP client of the actuator endpoint. One attempt per call, no timeout.
#[derive(Debug, Clone)]
pub struct SvenClient {
    http: Client,
    base_url: String,
}

impl SvenClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    pub fn command_url(&self) -> String {
        format!("{}{}", self.base_url, COMMAND_PATH)
    }

    pub fn state_url(&self) -> String {
        format!("{}{}", self.base_url, STATE_PATH)
    }

    /// POST one command. Non-success statuses become [`ClientError::Status`]
    /// carrying the body's `error` text when present.
    pub async fn send_command(&self, req: &CommandRequest) -> Result<CommandResponse, ClientError> {
        let url = self.command_url();
        let body = serde_json::to_vec(req).map_err(|e| ClientError::Malformed(e.to_string()))?;
        debug!(url = %url, command = %req.command, value = req.value, "sending command");

        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        trace!(status = status.as_u16(), body = %text, "command response");

        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        serde_json::from_str::<CommandResponse>(&text)
            .map_err(|e| ClientError::Malformed(format!("command response: {}", e)))
    }

    pub async fn fetch_state(&self) -> Result<SvenState, ClientError> {
        let url = self.state_url();
        trace!(url = %url, "fetching state");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = read_body(resp).await;
            return Err(status_error(status, &text));
        }
        let text = resp.text().await?;
        serde_json::from_str::<SvenState>(&text)
            .map_err(|e| ClientError::Malformed(format!("state response: {}", e)))
    }
}

async fn read_body(resp: Response) -> String {
    resp.text().await.unwrap_or_default()
}

fn status_error(status: reqwest::StatusCode, body: &str) -> ClientError {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(|e| e.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
    });
    let message = from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    });
    ClientError::Status {
        status: status.as_u16(),
        message,
    }
}
