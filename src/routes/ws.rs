//! WebSocket handler — live comment feed for one game page.
//!
//! DESIGN
//! ======
//! On upgrade the handler opens a [`CommentFeed`] for the requested game and
//! enters a `select!` loop:
//! - Feed snapshots → `comments:list` / `comments:error` pushes
//! - Incoming client frames → parse + dispatch by syscall
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → feed opened, first snapshot pushed once loaded
//! 2. Realtime insert → feed re-fetches → new `comments:list` pushed
//! 3. `comments:watch` retargets the feed; `comments:refresh` forces a load
//! 4. Close → feed dropped, which closes its realtime channel

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::frame::{Data, ErrorCode, FRAME_CODE, Frame, Status, error_data};
use crate::services::comments::{CommentFeed, FeedSnapshot};
use crate::state::AppState;
use crate::views::comments::render_comment_list;

pub const SYSCALL_LIST: &str = "comments:list";
pub const SYSCALL_ERROR: &str = "comments:error";
pub const SYSCALL_WATCH: &str = "comments:watch";
pub const SYSCALL_REFRESH: &str = "comments:refresh";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FeedRequestError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("game_id required")]
    MissingGame,
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
}

impl ErrorCode for FeedRequestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFrame(_) => "E_INVALID_FRAME",
            Self::MissingGame => "E_MISSING_GAME",
            Self::UnknownGame(_) => "E_UNKNOWN_GAME",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub game: Option<String>,
}

/// `GET /ws/comments?game=<id>`
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(game_id) = query.game.filter(|g| !g.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "game required").into_response();
    };
    if !state.catalog.contains(&game_id) {
        return (StatusCode::NOT_FOUND, "unknown game").into_response();
    }
    ws.on_upgrade(move |socket| run_ws(socket, state, game_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, game_id: String) {
    let mut feed = CommentFeed::open(state.backend.clone(), &game_id);
    let mut snapshots = feed.subscribe();
    info!(%game_id, "ws: comment feed opened");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let before = feed.game_id().to_owned();
                        for frame in process_inbound_text(&state, &mut feed, &text).await {
                            if send_frame(&mut socket, &frame).await.is_err() {
                                return;
                            }
                        }
                        if feed.game_id() != before {
                            snapshots = feed.subscribe();
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!(game_id = %feed.game_id(), "ws: feed task ended");
                    break;
                }
                let Some(frame) = next_push(feed.game_id(), &mut snapshots) else { continue };
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(game_id = %feed.game_id(), "ws: comment feed closed");
}

fn next_push(game_id: &str, snapshots: &mut watch::Receiver<FeedSnapshot>) -> Option<Frame> {
    let snapshot = snapshots.borrow_and_update().clone();
    (snapshot.revision > 0).then(|| snapshot_frame(game_id, &snapshot))
}

/// Push frame for a feed snapshot.
pub(crate) fn snapshot_frame(game_id: &str, snapshot: &FeedSnapshot) -> Frame {
    let html = render_comment_list(&snapshot.comments, snapshot.error.as_deref());
    let syscall = if snapshot.error.is_some() { SYSCALL_ERROR } else { SYSCALL_LIST };
    let mut frame = Frame::request(syscall, Data::new())
        .with_game_id(game_id)
        .with_data("html", html)
        .with_data("count", snapshot.comments.len())
        .with_data("live", snapshot.live)
        .with_data("revision", snapshot.revision);
    if let Some(message) = &snapshot.error {
        frame = frame.with_data("message", message.clone());
    }
    frame
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
pub(crate) async fn process_inbound_text(state: &AppState, feed: &mut CommentFeed, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound frame");
            let err = FeedRequestError::InvalidFrame(e.to_string());
            return vec![Frame::request("gateway:error", error_data(&err))];
        }
    };

    match req.syscall.as_str() {
        SYSCALL_WATCH => {
            let Some(game_id) = req.data_str("game_id").or(req.game_id.as_deref()).filter(|g| !g.is_empty()) else {
                return vec![req.error_from(&FeedRequestError::MissingGame)];
            };
            if !state.catalog.contains(game_id) {
                return vec![req.error_from(&FeedRequestError::UnknownGame(game_id.to_owned()))];
            }
            let game_id = game_id.to_owned();
            feed.retarget(&game_id).await;
            vec![req.done().with_game_id(game_id)]
        }
        SYSCALL_REFRESH => {
            feed.refresh();
            vec![req.done()]
        }
        other => vec![req.error_from(&FeedRequestError::UnknownSyscall(other.to_owned()))],
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.data_str(FRAME_CODE).unwrap_or("");
        warn!(syscall = %frame.syscall, %code, "ws: send error frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
