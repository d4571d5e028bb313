use super::*;
use crate::backend::User;
use crate::catalog::Catalog;
use uuid::Uuid;

fn game(id: &str) -> Game {
    Catalog::bundled()
        .expect("bundled catalog")
        .get(id)
        .cloned()
        .expect("game in catalog")
}

fn signed_in() -> SessionState {
    let user = User {
        id: Uuid::new_v4(),
        email: Some("ada@example.com".into()),
        user_metadata: serde_json::json!({ "username": "ada" }),
    };
    SessionState::signed_in("token".into(), user, None)
}

#[test]
fn anonymous_visitors_get_prompts_instead_of_inputs() {
    let html = render_game_page(GameDetail::new(game("pacman-clone"), SessionState::anonymous()));
    assert!(html.contains("submit your score"));
    assert!(html.contains("join the conversation"));
    assert!(!html.contains(r#"name="content""#));
    assert!(!html.contains(r#"name="score""#));
    assert!(html.contains(r#"href="/login""#));
}

#[test]
fn signed_in_players_get_both_forms() {
    let html = render_game_page(GameDetail::new(game("pacman-clone"), signed_in()));
    assert!(html.contains(r#"action="/game/pacman-clone/scores""#));
    assert!(html.contains(r#"action="/game/pacman-clone/comments""#));
    assert!(html.contains(r#"name="content""#));
    assert!(html.contains(r#"name="score""#));
    assert!(html.contains("Welcome, ada!"));
}

#[test]
fn html5_games_embed_in_a_sandboxed_frame() {
    let g = game("pacman-clone");
    let path = g.path.clone();
    let html = render_game_page(GameDetail::new(g, SessionState::anonymous()));
    assert!(html.contains("<iframe"));
    assert!(html.contains(&format!(r#"src="{path}""#)));
    assert!(!html.contains("ruffle-host"));
    assert!(html.contains(&format!(r#"sandbox="{GAME_SANDBOX}""#)));
}

#[test]
fn same_origin_games_cannot_lift_their_sandbox() {
    assert!(GAME_SANDBOX.split_whitespace().any(|flag| flag == "allow-scripts"));
    assert!(!GAME_SANDBOX.split_whitespace().any(|flag| flag == "allow-same-origin"));

    let catalog = Catalog::bundled().expect("bundled catalog");
    for g in catalog.games().iter().filter(|g| g.kind == EmbedKind::Html5) {
        let html = render_game_page(GameDetail::new(g.clone(), SessionState::anonymous()));
        assert!(html.contains("allow-scripts"), "{}", g.id);
        assert!(!html.contains("allow-same-origin"), "{}", g.id);
    }
}

#[test]
fn flash_games_mount_through_the_emulator_host() {
    let g = game("asteroid-belt");
    let path = g.path.clone();
    let html = render_game_page(GameDetail::new(g, SessionState::anonymous()));
    assert!(html.contains("ruffle-host"));
    assert!(html.contains(&format!(r#"data-swf="{path}""#)));
    assert!(!html.contains("<iframe"));
}

#[test]
fn comment_section_carries_game_id_and_count() {
    let mut detail = GameDetail::new(game("snake-classic"), SessionState::anonymous());
    detail.comments_error = Some("Could not load comments: down".into());
    let html = render_game_page(detail);
    assert!(html.contains(r#"data-game-id="snake-classic""#));
    assert!(html.contains(r#"<span class="comments__count">0</span>"#));
    assert!(html.contains("Could not load comments: down"));
}

#[test]
fn failed_comment_keeps_draft_and_shows_error() {
    let mut detail = GameDetail::new(game("pacman-clone"), signed_in());
    detail.composer = CommentComposer {
        draft: "my draft".into(),
        submitting: false,
        error: Some("Failed to post comment: nope".into()),
    };
    let html = render_game_page(detail);
    assert!(html.contains(r#"value="my draft""#));
    assert!(html.contains("Failed to post comment: nope"));
}

#[test]
fn post_button_follows_composer_state() {
    let html = render_game_page(GameDetail::new(game("pacman-clone"), signed_in()));
    assert!(html.contains("disabled"));

    let mut detail = GameDetail::new(game("pacman-clone"), signed_in());
    detail.composer = CommentComposer::with_draft("gg");
    let html = render_game_page(detail);
    assert!(!html.contains("disabled"));

    let mut detail = GameDetail::new(game("pacman-clone"), signed_in());
    detail.composer = CommentComposer { draft: "gg".into(), submitting: true, error: None };
    let html = render_game_page(detail);
    assert!(html.contains("disabled"));
}

#[test]
fn score_outcome_messages_render() {
    let mut detail = GameDetail::new(game("pacman-clone"), signed_in());
    detail.score_state = FormState::Success("Score submitted!".into());
    let html = render_game_page(detail);
    assert!(html.contains("Score submitted!"));

    let mut detail = GameDetail::new(game("pacman-clone"), signed_in());
    detail.score_draft = "abc".into();
    detail.score_state = FormState::Error("Please enter a valid positive number for your score.".into());
    let html = render_game_page(detail);
    assert!(html.contains("Please enter a valid positive number for your score."));
    assert!(html.contains(r#"value="abc""#));
}
