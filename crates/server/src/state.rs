//! In-memory application state: exactly one live game session per server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use chess_core::record::Side;
use chess_core::session::{GameSession, SubmitOutcome};

use crate::clients::{AgentError, ProviderAgent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry in the game's chat/log transcript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// What actually sits behind a player slot.
#[derive(Clone)]
pub enum SlotBinding {
    Human,
    Agent(ProviderAgent),
}

impl SlotBinding {
    pub fn describe(&self) -> String {
        match self {
            SlotBinding::Human => "Human".to_string(),
            SlotBinding::Agent(agent) => {
                format!("{} ({})", agent.provider().name(), agent.model())
            }
        }
    }
}

/// The one live game plus everything the routes and the autoplay driver
/// share about it. Owned by the state mutex; the driver releases the lock
/// for the duration of provider round trips.
pub struct LiveGame {
    pub session: GameSession,
    slots: [SlotBinding; 2],
    pub chat: Vec<ChatMessage>,
    /// Bumped for every new configuration; a driver holding a stale value
    /// discards whatever its in-flight call returns.
    pub generation: u64,
    /// Set by the stop route; observed at the driver's per-turn checkpoint.
    pub stopped: bool,
    end_announced: bool,
}

impl LiveGame {
    pub fn new(session: GameSession, slots: [SlotBinding; 2], generation: u64) -> Self {
        Self {
            session,
            slots,
            chat: Vec::new(),
            generation,
            stopped: false,
            end_announced: false,
        }
    }

    pub fn slot(&self, side: Side) -> &SlotBinding {
        &self.slots[side.index()]
    }

    pub fn agent_for(&self, side: Side) -> Option<ProviderAgent> {
        match &self.slots[side.index()] {
            SlotBinding::Agent(agent) => Some(agent.clone()),
            SlotBinding::Human => None,
        }
    }

    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
    }

    /// Fold a raw agent reply into the session and narrate the result.
    pub fn apply_agent_reply(&mut self, side: Side, text: &str) {
        let trimmed = text.trim();
        self.chat
            .push(ChatMessage::assistant(format!("[{side}] {trimmed}")));
        match self.session.submit(trimmed) {
            SubmitOutcome::Applied { uci } => {
                tracing::info!("{side} played {uci}");
                self.chat
                    .push(ChatMessage::system(format!("{side} played {uci}.")));
            }
            SubmitOutcome::Rejected {
                reason,
                attempts_left,
            } => {
                tracing::warn!("Rejected move from {side}: {reason}");
                let attempts = attempts_left
                    .map(|n| format!(" ({n} attempts left)"))
                    .unwrap_or_default();
                self.chat.push(ChatMessage::system(format!(
                    "Move by {side} rejected: {reason}.{attempts}"
                )));
            }
            SubmitOutcome::Finished => {}
        }
    }

    /// Charge a failed provider call against the active agent's budget.
    pub fn note_agent_failure(&mut self, side: Side, err: &AgentError) {
        tracing::warn!("Agent call for {side} failed: {err}");
        let outcome = self.session.submit_failure(&err.to_string());
        if let SubmitOutcome::Rejected { attempts_left, .. } = outcome {
            let attempts = attempts_left
                .map(|n| format!(" ({n} attempts left)"))
                .unwrap_or_default();
            self.chat.push(ChatMessage::system(format!(
                "Agent call for {side} failed: {err}.{attempts}"
            )));
        }
    }

    /// Narrate the final result once, no matter which path terminated.
    pub fn announce_termination(&mut self) {
        if self.end_announced {
            return;
        }
        if let Some(termination) = self.session.termination() {
            self.end_announced = true;
            tracing::info!("Game over: {}", termination.label());
            self.chat.push(ChatMessage::system(termination.describe()));
        }
    }
}

pub type SharedGame = Arc<Mutex<Option<LiveGame>>>;

#[derive(Clone)]
pub struct AppState {
    pub game: SharedGame,
    next_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            game: Arc::new(Mutex::new(None)),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
