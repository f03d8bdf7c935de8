use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{AgentError, ChatTurn, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
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
        // Gemini's role vocabulary is "user"/"model".
        let contents: Vec<Value> = turns
            .iter()
            .map(|t| {
                json!({
                    "role": match t.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    },
                    "parts": [{"text": t.content}],
                })
            })
            .collect();

        let body = json!({
            "systemInstruction": {"parts": [{"text": system}]},
            "contents": contents,
        });

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Api {
                provider: "Gemini",
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let data: Value = resp.json().await?;
        extract_text(&data).ok_or(AgentError::EmptyResponse("Gemini"))
    }
}

/// Join the text parts of the first candidate.
fn extract_text(data: &Value) -> Option<String> {
    let parts = data
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let mut text = String::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
            text.push_str(t);
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
