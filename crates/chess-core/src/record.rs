use std::fmt;

use serde::{Deserialize, Serialize};

/// One side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Slot-array index (White = 0, Black = 1).
    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submitted move text was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No UCI-shaped substring (and no usable algebraic token) in the text.
    MalformedFormat,
    /// Algebraic notation that is ambiguous or matches no legal move.
    AmbiguousOrIllegalNotation,
    /// UCI-shaped candidate that is not legal in the current position.
    IllegalMove { candidate: String },
    /// The provider call itself failed (network, credentials, timeout).
    AgentFailure { message: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MalformedFormat => {
                write!(f, "no UCI move found in the reply")
            }
            RejectReason::AmbiguousOrIllegalNotation => {
                write!(f, "the notation does not resolve to a unique legal move")
            }
            RejectReason::IllegalMove { candidate } => {
                write!(f, "'{candidate}' is not a legal move in this position")
            }
            RejectReason::AgentFailure { message } => {
                write!(f, "provider call failed: {message}")
            }
        }
    }
}

/// One attempted half-move, accepted or not. Append-only; never mutated
/// after creation. Replaying the accepted records from the initial position
/// must reproduce the live position exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub side: Side,
    pub raw: String,
    pub uci: Option<String>,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl MoveRecord {
    pub fn accepted(side: Side, raw: &str, uci: &str) -> Self {
        Self {
            side,
            raw: raw.to_string(),
            uci: Some(uci.to_string()),
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(side: Side, raw: &str, reason: RejectReason) -> Self {
        Self {
            side,
            raw: raw.to_string(),
            uci: None,
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// Kinds of drawn game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl DrawKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawKind::InsufficientMaterial => "insufficient_material",
            DrawKind::SeventyFiveMoves => "seventyfive_moves",
            DrawKind::FivefoldRepetition => "fivefold_repetition",
        }
    }
}

/// What the rules of chess say about the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Ongoing,
    Checkmate(Side),
    Stalemate,
    Draw(DrawKind),
}

/// Why a session stopped accepting moves. Final once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate(Side),
    Stalemate,
    Draw(DrawKind),
    MoveLimitReached,
    /// The named side exhausted its retry ceiling without a legal move.
    AgentFailure(Side),
    Aborted,
}

impl Termination {
    /// Machine-readable status label, e.g. "checkmate:white".
    pub fn label(&self) -> String {
        match self {
            Termination::Checkmate(winner) => format!("checkmate:{winner}"),
            Termination::Stalemate => "stalemate".to_string(),
            Termination::Draw(kind) => format!("draw:{}", kind.as_str()),
            Termination::MoveLimitReached => "move_limit_reached".to_string(),
            Termination::AgentFailure(side) => format!("agent_failure:{side}"),
            Termination::Aborted => "aborted".to_string(),
        }
    }

    /// Human-readable sentence for the chat transcript.
    pub fn describe(&self) -> String {
        match self {
            Termination::Checkmate(winner) => format!("Checkmate, {winner} wins."),
            Termination::Stalemate => "Stalemate.".to_string(),
            Termination::Draw(DrawKind::InsufficientMaterial) => {
                "Draw by insufficient material.".to_string()
            }
            Termination::Draw(DrawKind::SeventyFiveMoves) => {
                "Draw by the seventy-five move rule.".to_string()
            }
            Termination::Draw(DrawKind::FivefoldRepetition) => {
                "Draw by fivefold repetition.".to_string()
            }
            Termination::MoveLimitReached => "Move limit reached.".to_string(),
            Termination::AgentFailure(side) => {
                format!("Game over: {side} failed to produce a legal move.")
            }
            Termination::Aborted => "Game aborted.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_labels() {
        assert_eq!(Termination::Checkmate(Side::White).label(), "checkmate:white");
        assert_eq!(
            Termination::Draw(DrawKind::InsufficientMaterial).label(),
            "draw:insufficient_material"
        );
        assert_eq!(Termination::AgentFailure(Side::Black).label(), "agent_failure:black");
    }

    #[test]
    fn record_serializes_without_null_reason() {
        let record = MoveRecord::accepted(Side::White, "e2e4", "e2e4");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["uci"], "e2e4");
        assert!(json.get("reason").is_none());
    }
}
