//! Game form posts — comments and scores.
//!
//! Success redirects back to the detail page (post/redirect/get) so a reload
//! never resubmits. Failure re-renders the page with the message and the
//! visitor's input intact.

use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use super::auth::CurrentSession;
use super::pages::{load_detail, not_found_response, set_score_flash};
use crate::services::auth::FormState;
use crate::services::comments::{CommentComposer, CommentError, submit_comment};
use crate::services::scores::{ScoreError, submit_score};
use crate::state::AppState;
use crate::views::game::render_game_page;

#[derive(Debug, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreInput {
    #[serde(default)]
    pub score: String,
}

fn error_status(backend_failure: bool) -> StatusCode {
    if backend_failure { StatusCode::BAD_GATEWAY } else { StatusCode::UNPROCESSABLE_ENTITY }
}

/// `POST /game/{id}/comments`
pub async fn post_comment(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
    Form(input): Form<CommentInput>,
) -> Response {
    let Some(game) = state.catalog.get(&id).cloned() else {
        return not_found_response(current);
    };
    if !current.state.can_submit() {
        return (current.jar, Redirect::to("/login")).into_response();
    }

    let mut composer = CommentComposer::with_draft(input.content);
    match submit_comment(state.backend.as_ref(), &current.state, &game.id, &mut composer).await {
        Ok(()) => (current.jar, Redirect::to(&format!("{}#comments", game.detail_href()))).into_response(),
        Err(e) => {
            let status = error_status(matches!(e, CommentError::Backend(_)));
            let mut detail = load_detail(&state, game, current.state.clone()).await;
            detail.composer = composer;
            (status, current.jar, Html(render_game_page(detail))).into_response()
        }
    }
}

/// `POST /game/{id}/scores`
pub async fn post_score(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
    Form(input): Form<ScoreInput>,
) -> Response {
    let Some(game) = state.catalog.get(&id).cloned() else {
        return not_found_response(current);
    };
    if !current.state.can_submit() {
        return (current.jar, Redirect::to("/login")).into_response();
    }

    match submit_score(state.backend.as_ref(), &current.state, &game.id, &input.score).await {
        Ok(_) => {
            let jar = set_score_flash(current.jar, &game.id, state.cookie_secure);
            (jar, Redirect::to(&game.detail_href())).into_response()
        }
        Err(e) => {
            let status = error_status(matches!(e, ScoreError::Backend(_)));
            let mut detail = load_detail(&state, game, current.state.clone()).await;
            detail.score_draft = input.score;
            detail.score_state = FormState::Error(e.to_string());
            (status, current.jar, Html(render_game_page(detail))).into_response()
        }
    }
}

#[cfg(test)]
#[path = "games_test.rs"]
mod tests;
