/// HTTP client for an OpenAI-compatible chat-completion endpoint.
///
/// Uses the synchronous `ureq` client with an explicit per-request timeout.
/// The bearer token is read from the environment variable named in
/// `[chat] api_key_env` when the client is built at startup; it never lives in
/// a config file and is never logged.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{ChatBackend, ChatMessage};
use crate::config::schema::ChatConfig;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Pull `choices[0].message.content` out of a chat-completion response body.
pub fn extract_answer(body: &serde_json::Value) -> Result<String> {
    if let Some(content) = body
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
    {
        return Ok(content.to_string());
    }

    if let Some(message) = api_error_message(body) {
        anyhow::bail!("chat endpoint returned an error: {message}");
    }
    anyhow::bail!("response has no choices[0].message.content")
}

/// The `error.message` field OpenAI-compatible APIs use for failures.
fn api_error_message(body: &serde_json::Value) -> Option<&str> {
    body.pointer("/error/message").and_then(|m| m.as_str())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous chat-completion client. Cheap to share across worker threads.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: String::new(),
            timeout,
        }
    }

    /// Build a client from the resolved config, reading the key from the
    /// environment.
    pub fn from_config(config: &ChatConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        let mut client = Self::new(
            config.endpoint.trim(),
            config.model.clone(),
            api_key,
            Duration::from_millis(config.timeout_ms),
        );
        client.api_key_env = config.api_key_env.clone();
        client
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ChatBackend for ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            if self.api_key_env.is_empty() {
                anyhow::bail!("no API key configured");
            }
            anyhow::bail!("no API key configured (set {})", self.api_key_env);
        };

        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        let resp = match ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(&body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                let detail = serde_json::from_str::<serde_json::Value>(&text)
                    .ok()
                    .and_then(|v| api_error_message(&v).map(str::to_string))
                    .unwrap_or(text);
                anyhow::bail!("chat endpoint returned HTTP {code}: {}", detail.trim());
            }
            Err(e) => return Err(e).context("chat completion request failed"),
        };

        let parsed: serde_json::Value = resp
            .into_json()
            .context("failed to parse chat completion response")?;

        extract_answer(&parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn has_credentials(&self) -> bool {
        self.has_api_key()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_answer_reads_first_choice() {
        let body = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "first" } },
                { "message": { "role": "assistant", "content": "second" } }
            ]
        });
        assert_eq!(extract_answer(&body).unwrap(), "first");
    }

    #[test]
    fn extract_answer_reports_api_error() {
        let body = serde_json::json!({ "error": { "message": "Invalid API Key" } });
        let err = extract_answer(&body).unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn extract_answer_rejects_missing_field() {
        let body = serde_json::json!({ "choices": [] });
        assert!(extract_answer(&body).is_err());
        let body = serde_json::json!({ "choices": [{ "message": { "content": 42 } }] });
        assert!(extract_answer(&body).is_err());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let client = ChatClient::new("http://localhost", "m", Some("  ".to_string()), Duration::from_secs(1));
        assert!(!client.has_api_key());
        let err = client.complete(&[ChatMessage::user("hi")]).unwrap_err();
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn from_config_uses_configured_timeout_and_endpoint() {
        let config = ChatConfig {
            endpoint: " http://localhost:9/v1/chat/completions ".to_string(),
            timeout_ms: 1500,
            api_key_env: "MALLSCOPE_TEST_UNSET_KEY".to_string(),
            ..ChatConfig::default()
        };
        let client = ChatClient::from_config(&config);
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
        assert_eq!(client.timeout(), Duration::from_millis(1500));
        assert_eq!(client.model_name(), "llama3-8b-8192");
        assert!(!client.has_api_key());
    }

    #[test]
    fn request_body_shape() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("q")];
        let body = ChatRequest {
            model: "llama3-8b-8192",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
    }
}
