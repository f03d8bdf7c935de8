//! Turn Controller — a resumable, synchronous state machine over one game.
//!
//! The session decides whose input is needed next and folds submitted move
//! text into the position; it never performs I/O. An async driver owns the
//! provider round trips and feeds replies in through [`GameSession::submit`],
//! so cancellation and step-by-step testing need no timers or network.

use crate::board::BoardState;
use crate::normalize::{normalize, MoveOutcome};
use crate::record::{MoveRecord, RejectReason, Side, TerminalStatus, Termination};

/// Who controls a slot. The concrete provider binding lives with the driver;
/// the state machine only needs to know whether a slot expires retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Human,
    Agent,
}

/// Per-session ceilings.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Half-moves this session may apply before terminating.
    pub move_ceiling: u32,
    /// Rejected attempts an agent gets per turn before the game is forfeit.
    pub retry_ceiling: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            move_ceiling: 200,
            retry_ceiling: 3,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("move ceiling must be at least 1")]
    InvalidMoveCeiling,

    #[error("retry ceiling must be at least 1")]
    InvalidRetryCeiling,
}

/// Where the turn cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Suspended until a human submits a move. Never expires.
    AwaitingHuman(Side),
    /// The driver should obtain a proposal from this side's agent.
    AwaitingAgent(Side),
    /// Final; only a fresh session continues play.
    Terminated(Termination),
}

/// What one submission did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied {
        uci: String,
    },
    Rejected {
        reason: RejectReason,
        /// Attempts the active agent has left; None for human rejections,
        /// which never count toward a ceiling.
        attempts_left: Option<u32>,
    },
    /// The session had already terminated; nothing was recorded.
    Finished,
}

pub struct GameSession {
    board: BoardState,
    slots: [SlotKind; 2],
    records: Vec<MoveRecord>,
    limits: Limits,
    /// Half-moves applied since this session was configured; the move
    /// ceiling counts these, not any carried-over history.
    applied: u32,
    /// Rejections charged to the active agent this turn.
    turn_rejections: u32,
    termination: Option<Termination>,
}

impl GameSession {
    pub fn new(white: SlotKind, black: SlotKind, limits: Limits) -> Result<Self, SessionError> {
        Self::with_board(BoardState::new(), Vec::new(), white, black, limits)
    }

    /// Resume an existing position under new slots/limits (mid-game
    /// reconfiguration with the board preserved). The carried records keep
    /// the replay invariant intact; ceilings count from zero again.
    pub fn with_board(
        board: BoardState,
        records: Vec<MoveRecord>,
        white: SlotKind,
        black: SlotKind,
        limits: Limits,
    ) -> Result<Self, SessionError> {
        if limits.move_ceiling == 0 {
            return Err(SessionError::InvalidMoveCeiling);
        }
        if limits.retry_ceiling == 0 {
            return Err(SessionError::InvalidRetryCeiling);
        }
        let termination = match board.terminal_status() {
            TerminalStatus::Ongoing => None,
            status => Some(Self::termination_from(status)),
        };
        Ok(Self {
            board,
            slots: [white, black],
            records,
            limits,
            applied: 0,
            turn_rejections: 0,
            termination,
        })
    }

    fn termination_from(status: TerminalStatus) -> Termination {
        match status {
            TerminalStatus::Checkmate(winner) => Termination::Checkmate(winner),
            TerminalStatus::Stalemate => Termination::Stalemate,
            TerminalStatus::Draw(kind) => Termination::Draw(kind),
            TerminalStatus::Ongoing => unreachable!("ongoing is not terminal"),
        }
    }

    pub fn state(&self) -> TurnState {
        if let Some(termination) = self.termination {
            return TurnState::Terminated(termination);
        }
        let side = self.board.turn();
        match self.slot(side) {
            SlotKind::Human => TurnState::AwaitingHuman(side),
            SlotKind::Agent => TurnState::AwaitingAgent(side),
        }
    }

    pub fn slot(&self, side: Side) -> SlotKind {
        self.slots[side.index()]
    }

    pub fn turn(&self) -> Side {
        self.board.turn()
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    pub fn legal_moves(&self) -> Vec<String> {
        self.board.legal_moves()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// UCI strings of every accepted move, oldest first.
    pub fn accepted_moves(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.accepted)
            .filter_map(|r| r.uci.clone())
            .collect()
    }

    pub fn halfmoves_played(&self) -> u32 {
        self.applied
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// The rejection the active side must correct, if its last attempt
    /// failed. Cleared by the next accepted move.
    pub fn last_rejection(&self) -> Option<&MoveRecord> {
        self.records.last().filter(|r| !r.accepted)
    }

    pub fn status_label(&self) -> String {
        match self.termination {
            Some(termination) => termination.label(),
            None => "ongoing".to_string(),
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Tear down into (board, records) for a preserve-position handoff.
    pub fn into_parts(self) -> (BoardState, Vec<MoveRecord>) {
        (self.board, self.records)
    }

    /// Feed one piece of move text from whoever is to move. Normalizes,
    /// applies on acceptance, and advances the state machine: terminal
    /// positions and the move ceiling terminate, rejections charge the
    /// active agent's retry budget.
    pub fn submit(&mut self, raw: &str) -> SubmitOutcome {
        if self.termination.is_some() {
            return SubmitOutcome::Finished;
        }
        let side = self.board.turn();
        match normalize(raw, &self.board) {
            MoveOutcome::Accepted(uci) => match self.board.apply(&uci) {
                Ok(()) => {
                    self.records.push(MoveRecord::accepted(side, raw, &uci));
                    self.applied += 1;
                    self.turn_rejections = 0;
                    match self.board.terminal_status() {
                        TerminalStatus::Ongoing => {
                            if self.applied >= self.limits.move_ceiling {
                                self.termination = Some(Termination::MoveLimitReached);
                            }
                        }
                        status => {
                            self.termination = Some(Self::termination_from(status));
                        }
                    }
                    SubmitOutcome::Applied { uci }
                }
                // Normalizer output is drawn from the legal set, so this
                // only trips if board and normalizer disagree.
                Err(_) => self.reject(side, raw, RejectReason::IllegalMove { candidate: uci }),
            },
            MoveOutcome::IllegalMove(candidate) => {
                self.reject(side, raw, RejectReason::IllegalMove { candidate })
            }
            MoveOutcome::AmbiguousOrIllegalNotation(_) => {
                self.reject(side, raw, RejectReason::AmbiguousOrIllegalNotation)
            }
            MoveOutcome::MalformedFormat(_) => {
                self.reject(side, raw, RejectReason::MalformedFormat)
            }
        }
    }

    /// Record a failed provider call (network, credential, timeout) against
    /// the active agent's retry budget.
    pub fn submit_failure(&mut self, message: &str) -> SubmitOutcome {
        if self.termination.is_some() {
            return SubmitOutcome::Finished;
        }
        let side = self.board.turn();
        self.reject(
            side,
            "",
            RejectReason::AgentFailure {
                message: message.to_string(),
            },
        )
    }

    /// Terminate an ongoing session at the user's request.
    pub fn abort(&mut self) {
        if self.termination.is_none() {
            self.termination = Some(Termination::Aborted);
        }
    }

    fn reject(&mut self, side: Side, raw: &str, reason: RejectReason) -> SubmitOutcome {
        self.records
            .push(MoveRecord::rejected(side, raw, reason.clone()));
        let attempts_left = match self.slot(side) {
            SlotKind::Human => None,
            SlotKind::Agent => {
                self.turn_rejections += 1;
                let left = self.limits.retry_ceiling - self.turn_rejections;
                if left == 0 {
                    self.termination = Some(Termination::AgentFailure(side));
                }
                Some(left)
            }
        };
        SubmitOutcome::Rejected {
            reason,
            attempts_left,
        }
    }
}
