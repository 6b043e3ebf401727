//! Anthropic Messages API client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ModelResponse, ReviewModel};
use crate::{Error, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Anthropic Messages API
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::model_fatal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url,
            max_tokens,
        })
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: i64,
    output_tokens: i64,
}

#[async_trait]
impl ReviewModel for AnthropicClient {
    async fn submit(&self, prompt: &str, model: &str) -> Result<ModelResponse> {
        let request = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let message = format!("Messages request failed: {}", e);
                if e.is_timeout() || e.is_connect() {
                    Error::model_transient(message)
                } else {
                    Error::model_fatal(message)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Messages API returned {}: {}", status, body);
            return Err(if transient_status(status.as_u16()) {
                Error::model_transient(message)
            } else {
                Error::model_fatal(message)
            });
        }

        let latency_ms = started.elapsed().as_millis() as i64;
        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::model_fatal(format!("Malformed Messages response: {}", e)))?;

        let raw: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if raw.is_empty() {
            return Err(Error::model_fatal("Messages response contained no text"));
        }

        debug!(model = %model, latency_ms, "Model reply received");

        Ok(ModelResponse {
            raw,
            prompt_tokens: parsed.usage.as_ref().map(|u| u.input_tokens),
            completion_tokens: parsed.usage.as_ref().map(|u| u.output_tokens),
            latency_ms,
        })
    }
}

/// Rate limits and server errors are worth retrying; other statuses are not
fn transient_status(code: u16) -> bool {
    code == 429 || code >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = serde_json::json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "{\"body\": \"ok\"}"}
            ],
            "usage": {"input_tokens": 1200, "output_tokens": 300}
        })
        .to_string();

        let parsed: MessagesResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert_eq!(parsed.content[0].text, "{\"body\": \"ok\"}");
        assert_eq!(parsed.usage.unwrap().input_tokens, 1200);
    }

    #[test]
    fn test_non_text_blocks_skipped_when_collecting() {
        let json = serde_json::json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "part one "},
                {"type": "text", "text": "part two"}
            ]
        })
        .to_string();

        let parsed: MessagesResponse = serde_json::from_str(&json).unwrap();
        let raw: String = parsed
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(raw, "part one part two");
    }

    #[test]
    fn test_transient_status() {
        assert!(transient_status(429));
        assert!(transient_status(500));
        assert!(transient_status(503));
        assert!(!transient_status(400));
        assert!(!transient_status(401));
        assert!(!transient_status(404));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AnthropicClient::new("key", "https://api.anthropic.com/", 1024).unwrap();
        assert_eq!(client.base_url, "https://api.anthropic.com");
    }
}
