use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{AgentError, ChatTurn, Role};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
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
        let mut messages = vec![json!({"role": "system", "content": system})];
        messages.extend(turns.iter().map(|t| {
            json!({
                "role": match t.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": t.content,
            })
        }));

        let body = json!({
            "model": self.model,
            "messages": messages,
        });

        let resp = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Api {
                provider: "OpenAI",
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let data: Value = resp.json().await?;
        extract_text(&data).ok_or(AgentError::EmptyResponse("OpenAI"))
    }
}

/// First choice's message content from a chat-completions response.
fn extract_text(data: &Value) -> Option<String> {
    let content = data
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}
