use server::config;
use server::routes;
use server::state::AppState;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    let state = AppState::new();

    // CORS — the board UI is served separately
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Game lifecycle
        .route("/api/game/new", post(routes::game::new_game))
        .route("/api/game/state", get(routes::game::get_state))
        .route("/api/game/move", post(routes::game::submit_move))
        .route("/api/game/stop", post(routes::game::stop_game))
        // Chat
        .route("/api/game/chat", post(routes::chat::send_chat))
        // Shared state
        .layer(Extension(state))
        .layer(Extension(config.clone()))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
