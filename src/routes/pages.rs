//! Page routes — catalog, game detail, leaderboard, static pages.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use super::auth::CurrentSession;
use crate::catalog::{Category, Game};
use crate::services::auth::FormState;
use crate::services::comments::{load_comments, load_error_message};
use crate::services::scores::{LeaderboardFilter, SCORE_SUBMITTED, load_leaderboard};
use crate::services::session::SessionState;
use crate::state::AppState;
use crate::views::game::{GameDetail, render_game_page};
use crate::views::home::render_home_page;
use crate::views::info::{render_about_page, render_contact_page, render_not_found_page};
use crate::views::leaderboard::render_leaderboard_page;

/// One-shot cookie naming the game whose score was just saved. The detail
/// page shows the confirmation once and removes it.
pub const SCORE_FLASH_COOKIE: &str = "arcade_score_flash";
const SCORE_FLASH_TTL_SECS: i64 = 60;

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub game: Option<String>,
}

// =============================================================================
// HELPERS
// =============================================================================

/// Detail page data with the comment list loaded; a load failure becomes
/// the list's inline message.
pub(crate) async fn load_detail(state: &AppState, game: Game, session: SessionState) -> GameDetail {
    let mut detail = GameDetail::new(game, session);
    match load_comments(state.backend.as_ref(), &detail.game.id).await {
        Ok(comments) => detail.comments = comments,
        Err(e) => detail.comments_error = Some(load_error_message(&e)),
    }
    detail
}

pub(crate) fn set_score_flash(jar: CookieJar, game_id: &str, secure: bool) -> CookieJar {
    jar.add(
        Cookie::build((SCORE_FLASH_COOKIE, game_id.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(Duration::seconds(SCORE_FLASH_TTL_SECS))
            .build(),
    )
}

/// Consume the flash if it names `game_id`.
pub(crate) fn take_score_flash(jar: CookieJar, game_id: &str) -> (CookieJar, bool) {
    let hit = jar
        .get(SCORE_FLASH_COOKIE)
        .is_some_and(|c| c.value() == game_id);
    if hit {
        (jar.remove(Cookie::build(SCORE_FLASH_COOKIE).path("/")), true)
    } else {
        (jar, false)
    }
}

/// 404 with the not-found view.
pub(crate) fn not_found_response(current: CurrentSession) -> Response {
    let page = render_not_found_page(current.welcome());
    (StatusCode::NOT_FOUND, current.jar, Html(page)).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /` — catalog grouped by category; unknown `?category=` shows all.
pub async fn home(State(state): State<AppState>, current: CurrentSession, Query(query): Query<HomeQuery>) -> Response {
    let selected = query.category.as_deref().and_then(Category::from_slug);
    let page = render_home_page(&state.catalog, selected, current.welcome());
    (current.jar, Html(page)).into_response()
}

/// `GET /game/{id}`
pub async fn game_detail(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> Response {
    let Some(game) = state.catalog.get(&id).cloned() else {
        return not_found_response(current);
    };
    let CurrentSession { state: session, jar } = current;
    let (jar, score_saved) = take_score_flash(jar, &game.id);
    let mut detail = load_detail(&state, game, session).await;
    if score_saved && detail.session.can_submit() {
        detail.score_state = FormState::Success(SCORE_SUBMITTED.into());
    }
    (jar, Html(render_game_page(detail))).into_response()
}

/// `GET /high-scores`
pub async fn high_scores(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<BoardQuery>,
) -> Response {
    let filter = LeaderboardFilter::from_param(query.game.as_deref());
    let board = load_leaderboard(state.backend.as_ref(), &state.catalog, &filter)
        .await
        .map_err(|e| format!("Could not fetch high scores: {}", e.user_message()));
    let page = render_leaderboard_page(&state.catalog, filter, board, current.welcome());
    (current.jar, Html(page)).into_response()
}

/// `GET /about`
pub async fn about(current: CurrentSession) -> Response {
    let page = render_about_page(current.welcome());
    (current.jar, Html(page)).into_response()
}

/// `GET /contact`
pub async fn contact(current: CurrentSession) -> Response {
    let page = render_contact_page(current.welcome());
    (current.jar, Html(page)).into_response()
}

/// Fallback for unknown paths.
pub async fn not_found(current: CurrentSession) -> Response {
    not_found_response(current)
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
