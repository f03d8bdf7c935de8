use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{AgentError, ChatTurn, Role};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("ChessLM/1.0")
            .timeout(timeout)
            .build()
            .unwrap();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
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

        // think=false keeps reasoning models from burying the move in a
        // thinking trace.
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "think": false,
        });

        let url = format!("{}/api/chat", self.base_url);
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Api {
                provider: "Ollama",
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let data: Value = resp.json().await?;
        extract_text(&data).ok_or(AgentError::EmptyResponse("Ollama"))
    }
}

fn extract_text(data: &Value) -> Option<String> {
    let content = data.get("message")?.get("content")?.as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}
