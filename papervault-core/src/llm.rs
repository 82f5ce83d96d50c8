//! Blocking OpenRouter chat-completions client.
//!
//! Owns the transport retry policy: rate limits and server errors back off
//! exponentially, bad requests get a short linear budget, and a response
//! body that never decodes ends in a typed exhaustion error the caller can
//! degrade on. Content-level validation lives elsewhere; this module only
//! gets bytes to and from the API.

use std::thread;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::RetryConfig;
use crate::error::LlmError;

/// One message in a chat-completion conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.to_string()),
        }
    }

    pub fn user(text: &str) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.to_string()),
        }
    }

    pub fn assistant(text: &str) -> Self {
        Self {
            role: "assistant",
            content: MessageContent::Text(text.to_string()),
        }
    }

    /// User turn carrying a text prompt plus one PNG page image as a
    /// base64 data URL.
    pub fn user_with_image(text: &str, png: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/png;base64,{encoded}"),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct VisionClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl VisionClient {
    pub fn new(base_url: &str, api_key: &str, retry: RetryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(300))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        }
    }

    fn backoff_delay(&self, retries: usize) -> Duration {
        // Exponent capped so late retries plateau around two minutes
        let exponent = retries.min(6) as u32;
        Duration::from_secs(self.retry.base_delay_secs * 2u64.pow(exponent))
    }

    /// One completion round-trip with the transport retry policy applied.
    /// Returns the assistant message text.
    pub fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        json_response: bool,
    ) -> Result<String, LlmError> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if json_response {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        let url = format!("{}/chat/completions", self.base_url);

        // Flat throttle so bursts of sub-questions stay under rate limits
        thread::sleep(Duration::from_millis(self.retry.throttle_ms));

        let mut retries = 0usize;
        let mut bad_request_retries = 0usize;
        loop {
            if retries >= self.retry.transport_retries {
                return Err(LlmError::RetriesExhausted(self.retry.transport_retries));
            }

            let response = self
                .agent
                .post(&url)
                .set("Authorization", &format!("Bearer {}", self.api_key))
                .set("Content-Type", "application/json")
                .send_json(body.clone());

            match response {
                Ok(resp) => {
                    if let Ok(parsed) = resp.into_json::<CompletionResponse>() {
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.message.content);
                        if let Some(text) = content {
                            return Ok(text);
                        }
                    }
                    // Undecodable body or empty choices — gateways return
                    // HTML error pages under load. Back off and retry.
                    let wait = self.backoff_delay(retries);
                    println!(
                        "⚠️  Undecodable completion response, retrying in {}s... (attempt {}/{})",
                        wait.as_secs(),
                        retries + 1,
                        self.retry.transport_retries
                    );
                    thread::sleep(wait);
                    retries += 1;
                }
                Err(ureq::Error::Status(code, resp)) if code == 429 || code >= 500 => {
                    let wait = self.backoff_delay(retries);
                    println!(
                        "⚠️  Rate limited or server error ({code}), retrying in {}s... (attempt {}/{})",
                        wait.as_secs(),
                        retries + 1,
                        self.retry.transport_retries
                    );
                    drop(resp);
                    thread::sleep(wait);
                    retries += 1;
                }
                Err(ureq::Error::Status(400, resp)) => {
                    // 400s are occasionally transient content filtering;
                    // give them a short budget, then surface the body.
                    if bad_request_retries < 3 {
                        bad_request_retries += 1;
                        let wait = Duration::from_secs(3 * bad_request_retries as u64);
                        println!(
                            "⚠️  API 400 (possible content filter), retrying in {}s... (attempt {}/3)",
                            wait.as_secs(),
                            bad_request_retries
                        );
                        drop(resp);
                        thread::sleep(wait);
                    } else {
                        return Err(LlmError::Status {
                            status: 400,
                            body: resp.into_string().unwrap_or_default(),
                        });
                    }
                }
                Err(ureq::Error::Status(code, resp)) => {
                    return Err(LlmError::Status {
                        status: code,
                        body: resp.into_string().unwrap_or_default(),
                    });
                }
                Err(e) => return Err(LlmError::Transport(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_serializes_flat() {
        let message = ChatMessage::system("你是一位学术架构师。");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "你是一位学术架构师。");
    }

    #[test]
    fn test_image_message_serializes_as_parts() {
        let message = ChatMessage::user_with_image("分析附图", &[1, 2, 3]);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        let parts = json["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        let url = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_backoff_schedule_is_exponential_then_flat() {
        let client = VisionClient::new("http://localhost", "key", RetryConfig::default());
        assert_eq!(client.backoff_delay(0), Duration::from_secs(2));
        assert_eq!(client.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(client.backoff_delay(3), Duration::from_secs(16));
        // Capped past the sixth retry
        assert_eq!(client.backoff_delay(6), Duration::from_secs(128));
        assert_eq!(client.backoff_delay(14), Duration::from_secs(128));
    }
}
