use reqwest::Client;

pub const BASE_URL: &str = "http://localhost:8000";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Request body for a fresh human-vs-human game (no provider calls needed).
pub fn human_vs_human(move_ceiling: u32) -> serde_json::Value {
    serde_json::json!({
        "white": { "provider": "Human" },
        "black": { "provider": "Human" },
        "moveCeiling": move_ceiling,
    })
}
