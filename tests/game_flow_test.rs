//! Integration tests for the game lifecycle endpoints.
//!
//! Requires the server to be running on localhost:8000. Every game here is
//! human-vs-human so no provider credentials or network calls are involved.
//!
//! The server holds a single live game, so these tests must not interleave:
//! run with `cargo test -- --test-threads=1`.

mod common;

use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn start_game(client: &reqwest::Client, body: &Value) -> reqwest::Response {
    client
        .post(common::url("/api/game/new"))
        .json(body)
        .send()
        .await
        .expect("Failed to send new-game request")
}

async fn submit_move(client: &reqwest::Client, text: &str) -> Value {
    let resp = client
        .post(common::url("/api/game/move"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .expect("Failed to send move request");
    assert_eq!(resp.status(), 200, "Move submission should succeed");
    resp.json().await.unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Full flow: new game → state → accepted move → rejected move.
#[tokio::test]
async fn new_game_move_and_rejection() {
    let client = common::client();

    // ── New game ────────────────────────────────────────────────────
    let resp = start_game(&client, &common::human_vs_human(200)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["turn"], "white");
    assert_eq!(body["state"], "awaiting_human");
    assert_eq!(body["status"], "ongoing");
    assert_eq!(body["legalMoves"].as_array().unwrap().len(), 20);

    // ── State reflects the new game ─────────────────────────────────
    let resp = client
        .get(common::url("/api/game/state"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // ── Accepted move ───────────────────────────────────────────────
    let body = submit_move(&client, "e2e4").await;
    assert_eq!(body["move"]["accepted"], true);
    assert_eq!(body["move"]["uci"], "e2e4");
    assert_eq!(body["turn"], "black");
    assert!(body["fen"]
        .as_str()
        .unwrap()
        .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));

    // ── Rejected move (black's turn, nothing move-shaped) ───────────
    let body = submit_move(&client, "no idea what to play").await;
    assert_eq!(body["move"]["accepted"], false);
    assert_eq!(body["move"]["reason"], "malformed_format");
    assert_eq!(body["turn"], "black", "Rejection must not flip the turn");

    // Rejections are visible in the record history.
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["accepted"], false);
}

/// Algebraic notation is converted on the way in.
#[tokio::test]
async fn algebraic_input_normalizes_to_uci() {
    let client = common::client();
    start_game(&client, &common::human_vs_human(200)).await;

    let body = submit_move(&client, "e4").await;
    assert_eq!(body["move"]["accepted"], true);
    assert_eq!(body["move"]["uci"], "e2e4");

    let body = submit_move(&client, "Nf6").await;
    assert_eq!(body["move"]["accepted"], true);
    assert_eq!(body["move"]["uci"], "g8f6");
}

/// Stop terminates the session; further moves are refused.
#[tokio::test]
async fn stop_aborts_the_game() {
    let client = common::client();
    start_game(&client, &common::human_vs_human(200)).await;

    let resp = client
        .post(common::url("/api/game/stop"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "aborted");
    assert_eq!(body["state"], "terminated");

    let resp = client
        .post(common::url("/api/game/move"))
        .json(&json!({ "text": "e2e4" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409, "Moves after termination are a conflict");
}

/// The move ceiling ends the game at exactly the configured half-move.
#[tokio::test]
async fn move_ceiling_terminates_the_game() {
    let client = common::client();
    start_game(&client, &common::human_vs_human(2)).await;

    let body = submit_move(&client, "e2e4").await;
    assert_eq!(body["status"], "ongoing");
    let body = submit_move(&client, "e7e5").await;
    assert_eq!(body["status"], "move_limit_reached");
    assert_eq!(body["state"], "terminated");
    assert_eq!(body["halfmovesPlayed"], 2);
}

/// Unknown providers are a configuration error, not a crash.
#[tokio::test]
async fn unknown_provider_is_rejected() {
    let client = common::client();
    let resp = start_game(
        &client,
        &json!({
            "white": { "provider": "skynet" },
            "black": { "provider": "Human" },
        }),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Unsupported model provider"));
}

/// A zero move ceiling is refused.
#[tokio::test]
async fn zero_move_ceiling_is_rejected() {
    let client = common::client();
    let resp = start_game(&client, &common::human_vs_human(0)).await;
    assert_eq!(resp.status(), 400);
}
