//! The autoplay loop: runs consecutive agent turns until a human must act,
//! the game terminates, the user stops it, or the session is reconfigured.
//!
//! The loop is the only place moves are produced without an HTTP trigger.
//! It holds the state lock only at its per-turn checkpoints, never across a
//! provider round trip; a stale generation or the stop flag observed after
//! the call returns means the proposal is discarded, which is safe because
//! a proposal has no side effects until it is submitted.

use std::future::Future;

use chess_core::session::TurnState;

use crate::clients::{AgentError, ChatTurn, ProviderAgent};
use crate::game::prompt::{self, TurnRequest};
use crate::state::SharedGame;

/// Ask the bound provider for a move. The production proposer; tests inject
/// scripted ones.
pub async fn propose_via_provider(
    agent: ProviderAgent,
    request: TurnRequest,
) -> Result<String, AgentError> {
    let user = prompt::turn_prompt(&request);
    agent
        .complete(prompt::SYSTEM_PROMPT, &[ChatTurn::user(user)])
        .await
}

/// Drive agent turns for the session identified by `generation`.
///
/// Exits as soon as the session is gone, replaced, stopped, terminated, or
/// waiting on a human. One proposal is in flight at a time.
pub async fn run_autoplay<F, Fut>(game: SharedGame, generation: u64, propose: F)
where
    F: Fn(ProviderAgent, TurnRequest) -> Fut,
    Fut: Future<Output = Result<String, AgentError>>,
{
    loop {
        // Per-turn checkpoint: decide under the lock, call outside it.
        let (agent, request, side) = {
            let mut guard = game.lock().await;
            let Some(live) = guard.as_mut() else { return };
            if live.generation != generation || live.stopped {
                return;
            }
            let side = match live.session.state() {
                TurnState::AwaitingAgent(side) => side,
                TurnState::AwaitingHuman(_) => return,
                TurnState::Terminated(_) => {
                    live.announce_termination();
                    return;
                }
            };
            let Some(agent) = live.agent_for(side) else {
                // Slot kind says agent but no binding exists; charge it
                // like a dead provider.
                live.session.submit_failure("no agent bound for this slot");
                continue;
            };
            let request = TurnRequest {
                side,
                fen: live.session.fen(),
                history: live.session.accepted_moves(),
                legal_moves: live.session.legal_moves(),
                feedback: live
                    .session
                    .last_rejection()
                    .and_then(|r| r.reason.clone())
                    .map(|reason| reason.to_string()),
            };
            (agent, request, side)
        };

        let proposal = propose(agent, request).await;

        let mut guard = game.lock().await;
        let Some(live) = guard.as_mut() else { return };
        if live.generation != generation || live.stopped {
            // Cancellation won the race; the returned proposal is dropped.
            return;
        }

        match proposal {
            Ok(text) => live.apply_agent_reply(side, &text),
            Err(err) => live.note_agent_failure(side, &err),
        }

        if matches!(live.session.state(), TurnState::Terminated(_)) {
            live.announce_termination();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use chess_core::record::{Side, Termination};
    use chess_core::session::{GameSession, Limits, SlotKind, TurnState};

    use super::*;
    use crate::clients::Provider;
    use crate::config::Config;
    use crate::state::{LiveGame, SlotBinding};

    fn test_agent() -> ProviderAgent {
        ProviderAgent::from_parts(
            Provider::Ollama,
            "qwen3".to_string(),
            None,
            &Config::default(),
        )
        .unwrap()
    }

    fn shared_game(
        white: (SlotKind, SlotBinding),
        black: (SlotKind, SlotBinding),
        limits: Limits,
    ) -> SharedGame {
        let session = GameSession::new(white.0, black.0, limits).unwrap();
        let live = LiveGame::new(session, [white.1, black.1], 1);
        Arc::new(Mutex::new(Some(live)))
    }

    #[tokio::test]
    async fn suspends_after_single_agent_reply() {
        // White human has just played e2e4; Black is an agent.
        let game = shared_game(
            (SlotKind::Human, SlotBinding::Human),
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            Limits { move_ceiling: 10, retry_ceiling: 3 },
        );
        {
            let mut guard = game.lock().await;
            guard.as_mut().unwrap().session.submit("e2e4");
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        run_autoplay(game.clone(), 1, move |_agent, _req| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok("e7e5".to_string())
            }
        })
        .await;

        // Exactly one proposal, then suspension on the human's turn.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let guard = game.lock().await;
        let live = guard.as_ref().unwrap();
        assert_eq!(live.session.state(), TurnState::AwaitingHuman(Side::White));
        assert_eq!(live.session.accepted_moves(), vec!["e2e4", "e7e5"]);
    }

    #[tokio::test]
    async fn all_agent_game_runs_to_move_ceiling() {
        let game = shared_game(
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            Limits { move_ceiling: 6, retry_ceiling: 3 },
        );

        run_autoplay(game.clone(), 1, |_agent, req: TurnRequest| async move {
            // Deterministic legal play: always the first legal move.
            Ok(req.legal_moves[0].clone())
        })
        .await;

        let guard = game.lock().await;
        let live = guard.as_ref().unwrap();
        assert_eq!(
            live.session.state(),
            TurnState::Terminated(Termination::MoveLimitReached)
        );
        assert_eq!(live.session.halfmoves_played(), 6);
    }

    #[tokio::test]
    async fn retries_with_feedback_then_forfeits() {
        let game = shared_game(
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            (SlotKind::Human, SlotBinding::Human),
            Limits { move_ceiling: 10, retry_ceiling: 3 },
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        run_autoplay(game.clone(), 1, move |_agent, req: TurnRequest| {
            let counted = counted.clone();
            async move {
                let n = counted.fetch_add(1, Ordering::SeqCst);
                // Retries must carry the rejection back to the model.
                if n > 0 {
                    assert!(req.feedback.is_some());
                }
                Ok("I cannot decide".to_string())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let guard = game.lock().await;
        let live = guard.as_ref().unwrap();
        assert_eq!(
            live.session.state(),
            TurnState::Terminated(Termination::AgentFailure(Side::White))
        );
        assert_eq!(live.session.records().len(), 3);
        assert!(live.session.records().iter().all(|r| !r.accepted));
    }

    #[tokio::test]
    async fn provider_failures_are_retried_then_forfeit() {
        let game = shared_game(
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            (SlotKind::Human, SlotBinding::Human),
            Limits { move_ceiling: 10, retry_ceiling: 2 },
        );

        run_autoplay(game.clone(), 1, |_agent, _req| async move {
            Err(AgentError::EmptyResponse("Ollama"))
        })
        .await;

        let guard = game.lock().await;
        let live = guard.as_ref().unwrap();
        assert_eq!(
            live.session.state(),
            TurnState::Terminated(Termination::AgentFailure(Side::White))
        );
        assert_eq!(live.session.records().len(), 2);
    }

    #[tokio::test]
    async fn stop_flag_prevents_any_proposal() {
        let game = shared_game(
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            Limits::default(),
        );
        game.lock().await.as_mut().unwrap().stopped = true;

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        run_autoplay(game.clone(), 1, move |_agent, _req| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok("e2e4".to_string())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let guard = game.lock().await;
        assert_eq!(guard.as_ref().unwrap().session.accepted_moves().len(), 0);
    }

    #[tokio::test]
    async fn stale_generation_discards_returned_proposal() {
        let game = shared_game(
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            (SlotKind::Agent, SlotBinding::Agent(test_agent())),
            Limits::default(),
        );

        // Reconfigure while the proposal is "in flight": the driver runs
        // with generation 1, but the session now belongs to generation 2.
        let reconfigure = game.clone();
        run_autoplay(game.clone(), 1, move |_agent, _req| {
            let reconfigure = reconfigure.clone();
            async move {
                reconfigure.lock().await.as_mut().unwrap().generation = 2;
                Ok("e2e4".to_string())
            }
        })
        .await;

        let guard = game.lock().await;
        assert_eq!(guard.as_ref().unwrap().session.accepted_moves().len(), 0);
    }
}
