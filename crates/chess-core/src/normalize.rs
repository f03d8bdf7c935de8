//! Move Normalizer — turns free-form player text into a validated UCI move.
//!
//! Both humans and language models produce messy text ("I'll play e2e4!",
//! "Nf3 looks strong"); the normalizer extracts a candidate, checks it
//! against the legal-move set, and reports a structured outcome. Pure
//! function of its inputs.

use regex::Regex;

use crate::board::BoardState;

/// Result of normalizing one piece of move text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A legal move, normalized to UCI.
    Accepted(String),
    /// UCI-shaped candidate that is not in the legal set (wrong piece,
    /// blocked path, invalid square, leaves the king in check).
    IllegalMove(String),
    /// Algebraic notation found but ambiguous or matching no legal move.
    AmbiguousOrIllegalNotation(String),
    /// Nothing move-shaped in the text at all.
    MalformedFormat(String),
}

/// Scan `raw` for the first substring shaped like a UCI move and validate it
/// against the board's legal moves. When several candidates appear, the
/// first *legal* one wins; when none are legal, the first candidate is
/// reported so the rejection names a concrete token. Text with no UCI-shaped
/// substring falls back to algebraic notation ("Nf3", "e4", "O-O") resolved
/// through the board; only then is the text malformed.
///
/// The rank class is deliberately `[0-9]`: a token like "e9e9" is a UCI
/// *shaped* move on invalid squares, which classifies as an illegal move
/// rather than a format error.
pub fn normalize(raw: &str, board: &BoardState) -> MoveOutcome {
    let legal = board.legal_moves();

    let lowered = raw.to_ascii_lowercase();
    let uci_re = Regex::new(r"[a-h][0-9][a-h][0-9][qrbn]?").unwrap();
    let candidates: Vec<&str> = uci_re.find_iter(&lowered).map(|m| m.as_str()).collect();

    if let Some(hit) = candidates.iter().find(|c| legal.iter().any(|l| l == *c)) {
        return MoveOutcome::Accepted((*hit).to_string());
    }
    if let Some(first) = candidates.first() {
        return MoveOutcome::IllegalMove((*first).to_string());
    }

    // No UCI candidate — best-effort algebraic fallback.
    let san_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O").unwrap();
    let mut saw_notation = false;
    for token in san_re.find_iter(raw) {
        saw_notation = true;
        if let Some(uci) = board.san_to_uci(token.as_str()) {
            return MoveOutcome::Accepted(uci);
        }
    }

    if saw_notation {
        MoveOutcome::AmbiguousOrIllegalNotation(raw.to_string())
    } else {
        MoveOutcome::MalformedFormat(raw.to_string())
    }
}
