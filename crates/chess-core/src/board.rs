//! Board State — thin wrapper over shakmaty with UCI-string surfaces and
//! repetition tracking (shakmaty positions carry no history).

use std::collections::HashMap;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::record::{DrawKind, Side, TerminalStatus};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid UCI move '{0}'")]
    InvalidUci(String),

    #[error("illegal move '{0}'")]
    IllegalMove(String),
}

/// The sole owner of the position. Mutated only through `apply`; everything
/// handed out (FEN, legal moves) is a snapshot.
#[derive(Debug, Clone)]
pub struct BoardState {
    pos: Chess,
    /// Occurrence count per EPD (position minus move counters), for
    /// threefold/fivefold detection.
    repetitions: HashMap<String, u32>,
}

impl BoardState {
    pub fn new() -> Self {
        let pos = Chess::default();
        let mut board = Self {
            pos,
            repetitions: HashMap::new(),
        };
        board.count_current();
        board
    }

    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|_| BoardError::InvalidFen(fen.to_string()))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| BoardError::InvalidFen(fen.to_string()))?;
        let mut board = Self {
            pos,
            repetitions: HashMap::new(),
        };
        board.count_current();
        Ok(board)
    }

    /// Rebuild a position by replaying accepted UCI moves from the start.
    pub fn replay(moves: &[String]) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for uci in moves {
            board.apply(uci)?;
        }
        Ok(board)
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    /// FEN without the move counters — the repetition key.
    fn epd(&self) -> String {
        let fen = self.fen();
        fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }

    fn count_current(&mut self) {
        *self.repetitions.entry(self.epd()).or_insert(0) += 1;
    }

    pub fn turn(&self) -> Side {
        match self.pos.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    /// All legal moves for the side to move, as UCI strings.
    pub fn legal_moves(&self) -> Vec<String> {
        self.pos
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .collect()
    }

    /// Apply a UCI move. The only mutation path.
    pub fn apply(&mut self, uci: &str) -> Result<(), BoardError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| BoardError::InvalidUci(uci.to_string()))?;
        let mv = parsed
            .to_move(&self.pos)
            .map_err(|_| BoardError::IllegalMove(uci.to_string()))?;
        self.pos.play_unchecked(mv);
        self.count_current();
        Ok(())
    }

    /// Resolve an algebraic-notation token ("Nf3", "O-O", "e8=Q#") to UCI.
    /// Returns None on ambiguity or no legal match.
    pub fn san_to_uci(&self, token: &str) -> Option<String> {
        let san: SanPlus = token.parse().ok()?;
        let mv = san.san.to_move(&self.pos).ok()?;
        Some(mv.to_uci(CastlingMode::Standard).to_string())
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.pos.halfmoves()
    }

    /// Fifty-move draw claim is available (not automatic).
    pub fn can_claim_fifty_moves(&self) -> bool {
        self.pos.halfmoves() >= 100
    }

    /// Threefold-repetition draw claim is available (not automatic).
    pub fn can_claim_threefold(&self) -> bool {
        self.repetitions.get(&self.epd()).copied().unwrap_or(0) >= 3
    }

    /// Terminal conditions that end the game without a claim: mate,
    /// stalemate, dead position, seventy-five moves, fivefold repetition.
    pub fn terminal_status(&self) -> TerminalStatus {
        if self.pos.is_checkmate() {
            return TerminalStatus::Checkmate(self.turn().flip());
        }
        if self.pos.is_stalemate() {
            return TerminalStatus::Stalemate;
        }
        if self.pos.is_insufficient_material() {
            return TerminalStatus::Draw(DrawKind::InsufficientMaterial);
        }
        if self.pos.halfmoves() >= 150 {
            return TerminalStatus::Draw(DrawKind::SeventyFiveMoves);
        }
        if self.repetitions.get(&self.epd()).copied().unwrap_or(0) >= 5 {
            return TerminalStatus::Draw(DrawKind::FivefoldRepetition);
        }
        TerminalStatus::Ongoing
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
