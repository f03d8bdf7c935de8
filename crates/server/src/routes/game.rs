use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use chess_core::record::Side;
use chess_core::session::{GameSession, Limits, SlotKind, SubmitOutcome, TurnState};

use crate::clients::{Provider, ProviderAgent};
use crate::config::Config;
use crate::error::AppError;
use crate::game::driver;
use crate::state::{AppState, ChatMessage, LiveGame, SharedGame, SlotBinding};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfigDto {
    /// "Human" or a provider name (Anthropic, OpenAI, Gemini, Mistral, Ollama).
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGameRequest {
    pub white: PlayerConfigDto,
    pub black: PlayerConfigDto,
    pub move_ceiling: Option<u32>,
    pub retry_ceiling: Option<u32>,
    /// Keep the current board and history instead of resetting (mid-game
    /// reconfiguration).
    #[serde(default)]
    pub preserve_position: bool,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub text: String,
}

/// POST /api/game/new
pub async fn new_game(
    Extension(state): Extension<AppState>,
    Extension(config): Extension<Config>,
    Json(req): Json<NewGameRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let (white_kind, white_binding) = resolve_slot(&req.white, &config)?;
    let (black_kind, black_binding) = resolve_slot(&req.black, &config)?;
    let limits = Limits {
        move_ceiling: req.move_ceiling.unwrap_or(config.default_move_ceiling),
        retry_ceiling: req.retry_ceiling.unwrap_or(config.agent_retry_ceiling),
    };
    // Validate before the preserve path consumes the previous session.
    if limits.move_ceiling == 0 || limits.retry_ceiling == 0 {
        return Err(AppError::InvalidConfiguration(
            "moveCeiling and retryCeiling must be at least 1".into(),
        ));
    }

    let mut guard = state.game.lock().await;

    let session = if req.preserve_position {
        match guard.take() {
            Some(previous) => {
                let (board, records) = previous.session.into_parts();
                GameSession::with_board(board, records, white_kind, black_kind, limits)
            }
            None => GameSession::new(white_kind, black_kind, limits),
        }
    } else {
        GameSession::new(white_kind, black_kind, limits)
    }
    .map_err(|e| AppError::InvalidConfiguration(e.to_string()))?;

    let generation = state.next_generation();
    let mut live = LiveGame::new(session, [white_binding, black_binding], generation);

    tracing::info!(
        "New game (gen {generation}): white={}, black={}, move_ceiling={}, preserve={}",
        live.slot(Side::White).describe(),
        live.slot(Side::Black).describe(),
        limits.move_ceiling,
        req.preserve_position,
    );
    let opening_note = if req.preserve_position {
        format!("Players reconfigured. {} to move.", live.session.turn())
    } else {
        "New game started. White to move.".to_string()
    };
    live.push_chat(ChatMessage::system(opening_note));

    let starts_with_agent = matches!(live.session.state(), TurnState::AwaitingAgent(_));
    let view = state_view(&live);
    *guard = Some(live);
    drop(guard);

    if starts_with_agent {
        spawn_autoplay(state.game.clone(), generation);
    }

    Ok(Json(view))
}

/// GET /api/game/state
pub async fn get_state(
    Extension(state): Extension<AppState>,
) -> Result<Json<JsonValue>, AppError> {
    let guard = state.game.lock().await;
    let live = guard
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No active game".into()))?;
    Ok(Json(state_view(live)))
}

/// POST /api/game/move
pub async fn submit_move(
    Extension(state): Extension<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let mut guard = state.game.lock().await;
    let live = guard
        .as_mut()
        .ok_or_else(|| AppError::NotFound("No active game".into()))?;

    match live.session.state() {
        TurnState::Terminated(_) => {
            return Err(AppError::Conflict("The game is over".into()));
        }
        TurnState::AwaitingAgent(side) => {
            return Err(AppError::Conflict(format!(
                "It is {side}'s turn and that side is not human"
            )));
        }
        TurnState::AwaitingHuman(_) => {}
    }

    let side = live.session.turn();
    live.push_chat(ChatMessage::user(req.text.clone()));
    let outcome = live.session.submit(&req.text);

    let result = match &outcome {
        SubmitOutcome::Applied { uci } => {
            tracing::info!("{side} played {uci}");
            live.push_chat(ChatMessage::system(format!("{side} played {uci}.")));
            json!({ "accepted": true, "uci": uci })
        }
        SubmitOutcome::Rejected { reason, .. } => {
            live.push_chat(ChatMessage::system(format!(
                "Move by {side} rejected: {reason}."
            )));
            json!({
                "accepted": false,
                "reason": reason,
                "detail": reason.to_string(),
            })
        }
        // Unreachable: terminated sessions were rejected above.
        SubmitOutcome::Finished => json!({ "accepted": false }),
    };

    live.announce_termination();
    let continues_with_agent = matches!(live.session.state(), TurnState::AwaitingAgent(_));
    let generation = live.generation;

    let mut view = state_view(live);
    view["move"] = result;
    drop(guard);

    if continues_with_agent {
        spawn_autoplay(state.game.clone(), generation);
    }

    Ok(Json(view))
}

/// POST /api/game/stop
pub async fn stop_game(
    Extension(state): Extension<AppState>,
) -> Result<Json<JsonValue>, AppError> {
    let mut guard = state.game.lock().await;
    let live = guard
        .as_mut()
        .ok_or_else(|| AppError::NotFound("No active game".into()))?;

    live.stopped = true;
    live.session.abort();
    live.announce_termination();
    tracing::info!("Game stopped by user");

    Ok(Json(state_view(live)))
}

/// Map a slot config onto (state-machine kind, driver binding). Credential
/// and provider problems surface here, at configuration time.
fn resolve_slot(
    dto: &PlayerConfigDto,
    config: &Config,
) -> Result<(SlotKind, SlotBinding), AppError> {
    if dto.provider.eq_ignore_ascii_case("human") {
        return Ok((SlotKind::Human, SlotBinding::Human));
    }
    let provider: Provider = dto
        .provider
        .parse()
        .map_err(AppError::InvalidConfiguration)?;
    let model = dto
        .model
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| provider.default_model().to_string());
    let api_key = dto.api_key.clone().filter(|k| !k.is_empty());
    let agent = ProviderAgent::from_parts(provider, model, api_key, config)
        .map_err(|e| AppError::InvalidConfiguration(e.to_string()))?;
    Ok((SlotKind::Agent, SlotBinding::Agent(agent)))
}

pub(crate) fn spawn_autoplay(game: SharedGame, generation: u64) {
    tokio::spawn(driver::run_autoplay(
        game,
        generation,
        driver::propose_via_provider,
    ));
}

/// The full client-facing view of the live game.
pub(crate) fn state_view(live: &LiveGame) -> JsonValue {
    let session = &live.session;
    let state_label = match session.state() {
        TurnState::AwaitingHuman(_) => "awaiting_human",
        TurnState::AwaitingAgent(_) => "awaiting_agent",
        TurnState::Terminated(_) => "terminated",
    };
    let limits = session.limits();
    let board = session.board();
    json!({
        "fen": session.fen(),
        "turn": session.turn(),
        "state": state_label,
        "status": session.status_label(),
        "white": live.slot(Side::White).describe(),
        "black": live.slot(Side::Black).describe(),
        "moveCeiling": limits.move_ceiling,
        "retryCeiling": limits.retry_ceiling,
        "halfmovesPlayed": session.halfmoves_played(),
        "legalMoves": session.legal_moves(),
        "records": session.records(),
        "chat": &live.chat,
        "canClaimDraw": {
            "fiftyMoves": board.can_claim_fifty_moves(),
            "threefold": board.can_claim_threefold(),
        },
    })
}
