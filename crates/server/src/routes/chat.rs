use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::clients::ChatTurn;
use crate::error::AppError;
use crate::game::prompt;
use crate::state::{AppState, ChatMessage, ChatRole};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/game/chat
///
/// Routes free-text chat to the agent bound to the side to move; the board
/// is never touched. A human side to move just gets a notice back.
pub async fn send_chat(
    Extension(state): Extension<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let (agent, turns, generation) = {
        let mut guard = state.game.lock().await;
        let live = guard
            .as_mut()
            .ok_or_else(|| AppError::NotFound("No active game".into()))?;

        live.push_chat(ChatMessage::user(req.message.clone()));

        let side = live.session.turn();
        let Some(agent) = live.agent_for(side) else {
            let notice = "No AI configured for the side to move.";
            live.push_chat(ChatMessage::assistant(notice));
            return Ok(Json(json!({ "reply": notice, "chat": &live.chat })));
        };

        // Replay the transcript so the agent keeps conversational context;
        // the new message carries the position.
        let mut turns: Vec<ChatTurn> = live.chat[..live.chat.len() - 1]
            .iter()
            .filter_map(|m| match m.role {
                ChatRole::User => Some(ChatTurn::user(m.content.clone())),
                ChatRole::Assistant => Some(ChatTurn::assistant(m.content.clone())),
                ChatRole::System => None,
            })
            .collect();
        turns.push(ChatTurn::user(prompt::chat_prompt(
            &req.message,
            &live.session.fen(),
        )));

        (agent, turns, live.generation)
    };

    // Provider round trip happens without the state lock.
    let reply = match agent.complete(prompt::SYSTEM_PROMPT, &turns).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Chat call failed: {e}");
            format!("Error: {e}")
        }
    };

    let mut guard = state.game.lock().await;
    if let Some(live) = guard.as_mut() {
        if live.generation == generation {
            live.push_chat(ChatMessage::assistant(reply.clone()));
            return Ok(Json(json!({ "reply": reply, "chat": &live.chat })));
        }
    }
    // The game was reset mid-call; hand the reply back without logging it.
    Ok(Json(json!({ "reply": reply, "chat": [] })))
}
