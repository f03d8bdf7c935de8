use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{AgentError, ChatTurn, Role};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("ChessLM/1.0")
            .timeout(timeout)
            .build()
            .unwrap();
        Self {
            client,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(
        &self,
        system: &str,
        turns: &[ChatTurn],
    ) -> Result<String, AgentError> {
        let messages: Vec<Value> = turns
            .iter()
            .map(|t| {
                json!({
                    "role": match t.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": t.content,
                })
            })
            .collect();

        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": messages,
        });

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Api {
                provider: "Anthropic",
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let data: Value = resp.json().await?;
        extract_text(&data).ok_or(AgentError::EmptyResponse("Anthropic"))
    }
}

/// Concatenate the text blocks of a messages-API response.
fn extract_text(data: &Value) -> Option<String> {
    let blocks = data.get("content")?.as_array()?;
    let mut text = String::new();
    for block in blocks {
        if block.get("type").and_then(|v| v.as_str()) == Some("text") {
            if let Some(t) = block.get("text").and_then(|v| v.as_str()) {
                text.push_str(t);
            }
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_blocks() {
        let data = json!({
            "content": [
                {"type": "text", "text": "e2e4"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": " is my move"}
            ]
        });
        assert_eq!(extract_text(&data), Some("e2e4 is my move".to_string()));
    }

    #[test]
    fn empty_content_is_none() {
        assert_eq!(extract_text(&json!({"content": []})), None);
        assert_eq!(extract_text(&json!({"error": "nope"})), None);
    }
}
