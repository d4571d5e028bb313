//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page is rendered here on the server; the browser only runs the
//! small script under `/static`. Locally hosted game documents are served
//! from `/games`, and the comment feed socket lives at `/ws/comments`.

pub mod auth;
pub mod games;
pub mod pages;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/game/{id}", get(pages::game_detail))
        .route("/game/{id}/comments", post(games::post_comment))
        .route("/game/{id}/scores", post(games::post_score))
        .route("/high-scores", get(pages::high_scores))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/api/session", get(auth::session_json))
        .route("/ws/comments", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/games", ServeDir::new(&config.games_dir))
        .fallback(pages::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
