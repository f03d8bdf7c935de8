use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Provider credentials picked up from the environment; a request may
    /// override any of them per slot.
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub ollama_base_url: String,
    /// Timeout for a single provider round trip.
    pub agent_timeout_secs: u64,
    /// Rejected attempts an agent gets per turn before the game is forfeit.
    pub agent_retry_ceiling: u32,
    /// Default half-move bound on a game when the request omits one.
    pub default_move_ceiling: u32,
}

fn env_key(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            anthropic_api_key: env_key("ANTHROPIC_API_KEY"),
            openai_api_key: env_key("OPENAI_API_KEY"),
            gemini_api_key: env_key("GEMINI_API_KEY"),
            mistral_api_key: env_key("MISTRAL_API_KEY"),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            agent_timeout_secs: env::var("AGENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            agent_retry_ceiling: env::var("AGENT_RETRY_CEILING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            default_move_ceiling: env::var("DEFAULT_MOVE_CEILING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
        }
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            anthropic_api_key: None,
            openai_api_key: None,
            gemini_api_key: None,
            mistral_api_key: None,
            ollama_base_url: "http://localhost:11434".to_string(),
            agent_timeout_secs: 60,
            agent_retry_ceiling: 3,
            default_move_ceiling: 200,
        }
    }
}
