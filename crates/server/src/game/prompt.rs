//! Prompt construction for move proposals and chat.

use chess_core::record::Side;

/// How many legal moves a rejection hint lists before truncating.
const LEGAL_MOVES_SHOWN: usize = 20;

pub const SYSTEM_PROMPT: &str =
    "You are a strong chess player in an ongoing game. Answer concisely.";

/// Everything the driver snapshots from the session to ask an agent for a
/// move. Built under the state lock, consumed outside it.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub side: Side,
    pub fen: String,
    /// Accepted moves so far, oldest first, as UCI.
    pub history: Vec<String>,
    pub legal_moves: Vec<String>,
    /// Rejection detail from the previous attempt this turn, if any.
    pub feedback: Option<String>,
}

/// The move-request prompt. Mirrors the original agent instructions: UCI
/// only, own side only, with format examples; retries get the rejection
/// reason and a legal-move list appended.
pub fn turn_prompt(req: &TurnRequest) -> String {
    let mut prompt = format!(
        "You are playing chess as {}. It is strictly your turn.\nBoard FEN: {}.\n",
        req.side, req.fen
    );
    if !req.history.is_empty() {
        prompt.push_str(&format!(
            "Moves so far (UCI): {}.\n",
            format_history(&req.history)
        ));
    }
    prompt.push_str(
        "Rules you MUST follow:\n\
         - Only make a legal move for your side.\n\
         - Reply with exactly one move in UCI format 'from_square+to_square' (4-5 characters).\n\
         - UCI examples: e2e4 (pawn), g1f3 (knight), e1g1 (castling), e7e8q (pawn promotion to queen).\n\
         - Do NOT use algebraic notation like Nf3, Bb4, O-O, Bxe3. Use UCI format only.\n\
         - Do NOT attempt to move the opponent's pieces.\n",
    );
    if let Some(feedback) = &req.feedback {
        prompt.push_str(&format!(
            "Your previous reply was rejected: {}.\nLegal moves (UCI format): {}.\n",
            feedback,
            format_legal_moves(&req.legal_moves)
        ));
    }
    prompt
}

/// Chat messages carry the position so the agent can talk about it.
pub fn chat_prompt(message: &str, fen: &str) -> String {
    format!("{message}\nCurrent board state: {fen}")
}

/// Numbered move pairs: "1. e2e4 e7e5 2. g1f3".
fn format_history(moves: &[String]) -> String {
    let mut out = String::new();
    for (i, uci) in moves.iter().enumerate() {
        if i % 2 == 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{}. {}", i / 2 + 1, uci));
        } else {
            out.push_str(&format!(" {uci}"));
        }
    }
    out
}

/// First twenty moves, then a count, so a huge list never drowns the model.
fn format_legal_moves(moves: &[String]) -> String {
    if moves.len() <= LEGAL_MOVES_SHOWN {
        return moves.join(", ");
    }
    format!(
        "{}, ... and {} more",
        moves[..LEGAL_MOVES_SHOWN].join(", "),
        moves.len() - LEGAL_MOVES_SHOWN
    )
}
