//! Game detail page: embed, instructions, score form, live comments.

use leptos::prelude::*;

use super::comments::CommentList;
use super::layout::{Layout, LoginPrompt};
use super::render;
use crate::backend::Comment;
use crate::catalog::{EmbedKind, Game};
use crate::services::auth::FormState;
use crate::services::comments::CommentComposer;
use crate::services::session::SessionState;

/// Everything the detail page shows, already loaded.
#[derive(Debug, Clone)]
pub struct GameDetail {
    pub game: Game,
    pub session: SessionState,
    pub comments: Vec<Comment>,
    pub comments_error: Option<String>,
    pub composer: CommentComposer,
    pub score_draft: String,
    pub score_state: FormState,
}

impl GameDetail {
    #[must_use]
    pub fn new(game: Game, session: SessionState) -> Self {
        Self {
            game,
            session,
            comments: Vec::new(),
            comments_error: None,
            composer: CommentComposer::default(),
            score_draft: String::new(),
            score_state: FormState::Idle,
        }
    }
}

#[must_use]
pub fn render_game_page(detail: GameDetail) -> String {
    let welcome = detail.session.display_name().map(str::to_owned);
    let title = detail.game.name.clone();
    render(move || {
        view! {
            <Layout title=title welcome=welcome>
                <GamePage detail=detail/>
            </Layout>
        }
    })
}

#[component]
fn GamePage(detail: GameDetail) -> impl IntoView {
    let GameDetail { game, session, comments, comments_error, composer, score_draft, score_state } = detail;
    let can_submit = session.can_submit();
    let comment_count = comments.len();

    let score_section = if can_submit {
        view! { <ScoreForm game_id=game.id.clone() draft=score_draft state=score_state/> }.into_any()
    } else {
        view! { <LoginPrompt action="submit your score"/> }.into_any()
    };
    let comment_form = if can_submit {
        view! { <CommentForm game_id=game.id.clone() composer=composer/> }.into_any()
    } else {
        view! { <LoginPrompt action="join the conversation"/> }.into_any()
    };

    view! {
        <section class="panel panel--title">
            <h1 class="game-title">{game.name.clone()}</h1>
        </section>

        <GameEmbed game=game.clone()/>

        <div class="game-grid">
            <section class="panel game-grid__info">
                <h2>"Instructions"</h2>
                <p>{game.instructions.clone()}</p>
                <h3>"Description"</h3>
                <p>{game.description.clone()}</p>
            </section>
            <section class="panel game-grid__score">
                <h2>"Submit Score"</h2>
                {score_section}
            </section>
        </div>

        <section class="panel comments" id="comments" data-game-id=game.id.clone()>
            <h2>"Comments (" <span class="comments__count">{comment_count.to_string()}</span> ")"</h2>
            {comment_form}
            <div class="comment-list">
                <CommentList comments=comments error=comments_error/>
            </div>
        </section>
    }
}

/// Games are served from this origin, so the frame must not also get
/// `allow-same-origin`: together with `allow-scripts` the game could lift its
/// own sandbox.
pub(crate) const GAME_SANDBOX: &str = "allow-scripts allow-pointer-lock";

#[component]
fn GameEmbed(game: Game) -> impl IntoView {
    let width = game.embed_width();
    let height = game.embed_height();
    let frame_style = format!("min-height: {height}px");

    let player = match game.kind {
        EmbedKind::Html5 => view! {
            <iframe
                class="game-frame"
                src=game.path
                width=width
                height=height.to_string()
                title=game.name
                sandbox=GAME_SANDBOX
            ></iframe>
        }
        .into_any(),
        EmbedKind::Flash => view! {
            <div
                class="ruffle-host"
                data-swf=game.path
                data-width=width
                data-height=height.to_string()
                aria-label=game.name
            >
                <noscript>"This game needs JavaScript to run the Flash emulator."</noscript>
            </div>
        }
        .into_any(),
    };

    view! { <div class="game-stage" style=frame_style>{player}</div> }
}

#[component]
fn ScoreForm(game_id: String, draft: String, state: FormState) -> impl IntoView {
    let action = format!("/game/{game_id}/scores");
    let error = state.error().map(|msg| view! { <p class="form-error">{msg.to_owned()}</p> });
    let success = state.success().map(|msg| view! { <p class="form-success">{msg.to_owned()}</p> });
    view! {
        <form class="score-form" method="post" action=action data-busy-form="true">
            <input
                class="input"
                type="number"
                name="score"
                min="1"
                step="1"
                placeholder="Enter your final score"
                value=draft
            />
            <button class="button button--primary button--wide" type="submit" data-busy-label="Submitting...">
                "Submit High Score"
            </button>
            {error}
            {success}
        </form>
    }
}

#[component]
fn CommentForm(game_id: String, composer: CommentComposer) -> impl IntoView {
    let action = format!("/game/{game_id}/comments");
    let disabled = !composer.can_submit();
    let error = composer.error.map(|msg| view! { <p class="form-error">{msg}</p> });
    view! {
        <form class="comment-form" method="post" action=action data-busy-form="true">
            <input
                class="input comment-form__input"
                type="text"
                name="content"
                placeholder="Write a comment..."
                value=composer.draft
                data-require-text="true"
            />
            <button class="button button--primary" type="submit" disabled=disabled data-busy-label="Posting...">
                "Post"
            </button>
        </form>
        {error}
    }
}

#[cfg(test)]
#[path = "game_test.rs"]
mod tests;
