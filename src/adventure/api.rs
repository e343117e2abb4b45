//! Story backend client.
//!
//! One request shape, one reply envelope:
//!
//! ```text
//! POST /api/adventure            (or /api/step)
//! {"initData": "<signed host data>", "action": "open the door"}
//!
//! {"ok": true,  "message":  "..."}   or  {"ok": true,  "response": "..."}
//! {"ok": false, "detail":   "..."}   or  {"ok": false, "error":    "..."}
//! ```
//!
//! The backend reports application failures with 4xx statuses and a JSON body, so the
//! body is decoded whatever the status; only an undecodable body falls back to the
//! status line.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::BackendConfig;
use crate::logutil::escape_log;

/// Rendered when a failure reply carries no text.
pub const GENERIC_FAILURE: &str = "Ошибка";

/// Why a single turn produced no narrative.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TurnError {
    /// The backend answered `ok: false`.
    #[error("{0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("no reply within {0}s")]
    Timeout(u64),
    /// The body was not a reply envelope.
    #[error("unreadable reply: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StepRequest<'a> {
    #[serde(rename = "initData")]
    pub init_data: &'a str,
    pub action: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    ok: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ReplyEnvelope {
    fn into_result(self) -> Result<String, TurnError> {
        if self.ok {
            return self
                .message
                .or(self.response)
                .ok_or_else(|| TurnError::Decode("reply has no narrative text".to_string()));
        }
        let reason = self
            .detail
            .or(self.error)
            .and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        Err(TurnError::Rejected(reason))
    }
}

/// Decode a reply body received with `status`.
pub fn decode_reply(status: reqwest::StatusCode, body: &str) -> Result<String, TurnError> {
    match serde_json::from_str::<ReplyEnvelope>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(e) if status.is_success() => Err(TurnError::Decode(e.to_string())),
        Err(_) => Err(TurnError::Transport(format!("HTTP {}", status))),
    }
}

/// Anything that can advance the story by one player action.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Send `action` (empty for the opening turn) and return the narrative reply.
    async fn step(&self, init_data: &str, action: &str) -> Result<String, TurnError>;
}

/// [`StoryBackend`] over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lantern/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            timeout: config.timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, init_data: &str, action: &str) -> Result<String, TurnError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&StepRequest { init_data, action })
            .send()
            .await
            .map_err(|e| TurnError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TurnError::Transport(e.to_string()))?;
        debug!(
            "Backend replied {} ({} bytes): {}",
            status,
            body.len(),
            escape_log(&body)
        );
        decode_reply(status, &body)
    }
}

#[async_trait]
impl StoryBackend for HttpBackend {
    async fn step(&self, init_data: &str, action: &str) -> Result<String, TurnError> {
        debug!(
            "POST {} action=\"{}\"",
            self.endpoint,
            escape_log(action)
        );
        match timeout(self.timeout, self.exchange(init_data, action)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    warn!("Turn failed: {}", e);
                }
                result
            }
            Err(_) => {
                warn!("Backend did not answer within {}s", self.timeout.as_secs());
                Err(TurnError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn request_uses_init_data_field_name() {
        let body = serde_json::to_value(StepRequest {
            init_data: "<id>",
            action: "open the door",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"initData": "<id>", "action": "open the door"})
        );
    }

    #[test]
    fn success_accepts_message_or_response() {
        assert_eq!(
            decode_reply(StatusCode::OK, r#"{"ok":true,"message":"Тьма сгущается."}"#),
            Ok("Тьма сгущается.".to_string())
        );
        assert_eq!(
            decode_reply(StatusCode::OK, r#"{"ok":true,"response":"The door creaks open."}"#),
            Ok("The door creaks open.".to_string())
        );
        assert!(matches!(
            decode_reply(StatusCode::OK, r#"{"ok":true}"#),
            Err(TurnError::Decode(_))
        ));
    }

    #[test]
    fn failure_uses_detail_error_or_generic_text() {
        assert_eq!(
            decode_reply(StatusCode::FORBIDDEN, r#"{"ok":false,"detail":"Invalid initData"}"#),
            Err(TurnError::Rejected("Invalid initData".into()))
        );
        assert_eq!(
            decode_reply(StatusCode::OK, r#"{"ok":false,"error":"rate limited"}"#),
            Err(TurnError::Rejected("rate limited".into()))
        );
        assert_eq!(
            decode_reply(StatusCode::OK, r#"{"ok":false}"#),
            Err(TurnError::Rejected(GENERIC_FAILURE.into()))
        );
        let structured = decode_reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"ok":false,"detail":[{"loc":["body","action"]}]}"#,
        );
        assert!(matches!(structured, Err(TurnError::Rejected(s)) if s.contains("action")));
    }

    #[test]
    fn undecodable_body_reports_status_when_not_success() {
        assert_eq!(
            decode_reply(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>"),
            Err(TurnError::Transport("HTTP 502 Bad Gateway".into()))
        );
        assert!(matches!(
            decode_reply(StatusCode::OK, "not json"),
            Err(TurnError::Decode(_))
        ));
    }
}
