//! Outbound LLM provider clients. One module per backend; `ProviderAgent`
//! is the single dispatch point the game driver and chat route talk to.

pub mod anthropic;
pub mod gemini;
pub mod mistral;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

/// Supported LLM backends. Human slots never reach this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
    Mistral,
    Ollama,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Mistral => "Mistral",
            Provider::Ollama => "Ollama",
        }
    }

    /// Model used when the request leaves the field empty.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::OpenAi => "gpt-4o",
            Provider::Gemini => "gemini-1.5-flash",
            Provider::Mistral => "mistral-large-latest",
            Provider::Ollama => "qwen3",
        }
    }

    /// Ollama is local and unauthenticated; everyone else needs a key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            "mistral" => Ok(Provider::Mistral),
            "ollama" => Ok(Provider::Ollama),
            other => Err(format!("Unsupported model provider: {other}")),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One turn of provider-bound dialogue.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("missing API key for {0}")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty completion")]
    EmptyResponse(&'static str),
}

/// A configured agent bound to one player slot: provider, model, credential
/// and HTTP client, behind one `complete` call.
#[derive(Debug, Clone)]
pub enum ProviderAgent {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
    Gemini(gemini::GeminiClient),
    Mistral(mistral::MistralClient),
    Ollama(ollama::OllamaClient),
}

impl ProviderAgent {
    /// Build an agent from request fields, falling back to environment
    /// credentials. Fails fast on a missing key so misconfiguration is a
    /// game-setup error, not a mid-game surprise.
    pub fn from_parts(
        provider: Provider,
        model: String,
        api_key: Option<String>,
        config: &Config,
    ) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.agent_timeout_secs);
        let resolve = |env_key: &Option<String>| -> Result<String, AgentError> {
            api_key
                .clone()
                .or_else(|| env_key.clone())
                .ok_or(AgentError::MissingCredential(provider.name()))
        };
        match provider {
            Provider::Anthropic => Ok(Self::Anthropic(anthropic::AnthropicClient::new(
                resolve(&config.anthropic_api_key)?,
                model,
                timeout,
            ))),
            Provider::OpenAi => Ok(Self::OpenAi(openai::OpenAiClient::new(
                resolve(&config.openai_api_key)?,
                model,
                timeout,
            ))),
            Provider::Gemini => Ok(Self::Gemini(gemini::GeminiClient::new(
                resolve(&config.gemini_api_key)?,
                model,
                timeout,
            ))),
            Provider::Mistral => Ok(Self::Mistral(mistral::MistralClient::new(
                resolve(&config.mistral_api_key)?,
                model,
                timeout,
            ))),
            Provider::Ollama => Ok(Self::Ollama(ollama::OllamaClient::new(
                config.ollama_base_url.clone(),
                model,
                timeout,
            ))),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderAgent::Anthropic(_) => Provider::Anthropic,
            ProviderAgent::OpenAi(_) => Provider::OpenAi,
            ProviderAgent::Gemini(_) => Provider::Gemini,
            ProviderAgent::Mistral(_) => Provider::Mistral,
            ProviderAgent::Ollama(_) => Provider::Ollama,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderAgent::Anthropic(c) => c.model(),
            ProviderAgent::OpenAi(c) => c.model(),
            ProviderAgent::Gemini(c) => c.model(),
            ProviderAgent::Mistral(c) => c.model(),
            ProviderAgent::Ollama(c) => c.model(),
        }
    }

    /// One blocking round trip: system prompt + dialogue in, free text out.
    pub async fn complete(
        &self,
        system: &str,
        turns: &[ChatTurn],
    ) -> Result<String, AgentError> {
        match self {
            ProviderAgent::Anthropic(c) => c.complete(system, turns).await,
            ProviderAgent::OpenAi(c) => c.complete(system, turns).await,
            ProviderAgent::Gemini(c) => c.complete(system, turns).await,
            ProviderAgent::Mistral(c) => c.complete(system, turns).await,
            ProviderAgent::Ollama(c) => c.complete(system, turns).await,
        }
    }
}
