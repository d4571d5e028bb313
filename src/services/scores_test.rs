use super::*;
use crate::backend::memory::MemoryBackend;
use crate::catalog::UNKNOWN_GAME_NAME;
use uuid::Uuid;

fn row(game_id: &str, score: i64) -> HighScore {
    HighScore {
        id: score.into(),
        game_id: game_id.into(),
        user_id: Uuid::nil(),
        score,
        created_at: OffsetDateTime::UNIX_EPOCH,
        profiles: None,
    }
}

fn catalog() -> Catalog {
    Catalog::bundled().unwrap()
}

// =============================================================================
// FILTER
// =============================================================================

#[test]
fn filter_from_param() {
    assert_eq!(LeaderboardFilter::from_param(None), LeaderboardFilter::All);
    assert_eq!(LeaderboardFilter::from_param(Some("all")), LeaderboardFilter::All);
    assert_eq!(LeaderboardFilter::from_param(Some("  ")), LeaderboardFilter::All);
    assert_eq!(
        LeaderboardFilter::from_param(Some("pacman-clone")),
        LeaderboardFilter::Game("pacman-clone".into())
    );
}

#[test]
fn filter_param_round_trips_through_query_string() {
    assert_eq!(LeaderboardFilter::All.param(), "all");
    assert_eq!(LeaderboardFilter::Game("snake-classic".into()).param(), "snake-classic");
}

#[test]
fn filter_query_carries_limit() {
    let q = LeaderboardFilter::Game("snake-classic".into()).query();
    assert_eq!(q.game_id.as_deref(), Some("snake-classic"));
    assert_eq!(q.limit, LEADERBOARD_LIMIT);
    assert_eq!(LeaderboardFilter::All.query().game_id, None);
}

// =============================================================================
// RANKING
// =============================================================================

#[test]
fn ranks_are_positions_with_medals_for_top_three() {
    let rows = vec![
        row("pacman-clone", 900),
        row("snake-classic", 500),
        row("pacman-clone", 500),
        row("pacman-clone", 10),
    ];
    let ranked = rank_scores(rows, &catalog(), &LeaderboardFilter::All);
    let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert_eq!(ranked[0].medal(), Some(Medal::Gold));
    assert_eq!(ranked[1].medal(), Some(Medal::Silver));
    assert_eq!(ranked[2].medal(), Some(Medal::Bronze));
    assert_eq!(ranked[3].medal(), None);
    // Ties keep backend order.
    assert_eq!(ranked[1].game_id, "snake-classic");
}

#[test]
fn ranked_rows_carry_names() {
    let game = catalog().games()[0].clone();
    let ranked = rank_scores(vec![row(&game.id, 1), row("retired-game", 1)], &catalog(), &LeaderboardFilter::All);
    assert_eq!(ranked[0].game_name, game.name);
    assert_eq!(ranked[0].username, crate::backend::ANONYMOUS);
    assert_eq!(ranked[1].game_name, UNKNOWN_GAME_NAME);
}

#[test]
fn filtered_board_never_shows_other_games() {
    let rows = vec![row("pacman-clone", 3), row("snake-classic", 2), row("pacman-clone", 1)];
    let filter = LeaderboardFilter::Game("pacman-clone".into());
    let ranked = rank_scores(rows, &catalog(), &filter);
    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|r| r.game_id == "pacman-clone"));
    assert_eq!(ranked[1].rank, 2);
}

#[test]
fn board_never_exceeds_limit() {
    let rows: Vec<HighScore> = (0..250).map(|i| row("pacman-clone", 1000 - i)).collect();
    let ranked = rank_scores(rows, &catalog(), &LeaderboardFilter::All);
    assert_eq!(ranked.len(), LEADERBOARD_LIMIT);
    assert_eq!(ranked.last().map(|r| r.rank), Some(LEADERBOARD_LIMIT));
}

#[test]
fn format_score_groups_thousands() {
    assert_eq!(format_score(0), "0");
    assert_eq!(format_score(999), "999");
    assert_eq!(format_score(1000), "1,000");
    assert_eq!(format_score(15000), "15,000");
    assert_eq!(format_score(1_234_567), "1,234,567");
    assert_eq!(format_score(-4200), "-4,200");
}

// =============================================================================
// PARSE / SUBMIT
// =============================================================================

#[test]
fn parse_score_accepts_positive_integers() {
    assert_eq!(parse_score("15000"), Ok(15000));
    assert_eq!(parse_score(" 42 "), Ok(42));
}

#[test]
fn parse_score_rejects_bad_input() {
    assert_eq!(parse_score(""), Err(ScoreError::Missing));
    assert_eq!(parse_score("   "), Err(ScoreError::Missing));
    assert_eq!(parse_score("abc"), Err(ScoreError::NotNumeric));
    assert_eq!(parse_score("12.5"), Err(ScoreError::NotNumeric));
    assert_eq!(parse_score("99999999999999999999"), Err(ScoreError::NotNumeric));
    assert_eq!(parse_score("0"), Err(ScoreError::NotPositive));
    assert_eq!(parse_score("-5"), Err(ScoreError::NotPositive));
}

#[tokio::test]
async fn invalid_scores_issue_no_insert() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let state = SessionState::signed_in(session.access_token, session.user, None);

    for raw in ["0", "-10", "lots", ""] {
        assert!(submit_score(&backend, &state, "pacman-clone", raw).await.is_err());
    }
    assert_eq!(backend.write_attempts(), 0);
}

#[tokio::test]
async fn submit_issues_exact_row() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let user_id = session.user.id;
    let state = SessionState::signed_in(session.access_token, session.user, None);

    let inserted = submit_score(&backend, &state, "pacman-clone", "15000")
        .await
        .unwrap();
    assert_eq!(inserted, NewHighScore { game_id: "pacman-clone".into(), user_id, score: 15000 });
    assert_eq!(
        serde_json::to_value(&inserted).unwrap(),
        serde_json::json!({ "game_id": "pacman-clone", "user_id": user_id, "score": 15000 })
    );

    let stored = backend.high_scores();
    assert_eq!(stored.len(), 1);
    assert_eq!((stored[0].game_id.as_str(), stored[0].user_id, stored[0].score), ("pacman-clone", user_id, 15000));
}

#[tokio::test]
async fn anonymous_submit_is_refused() {
    let backend = MemoryBackend::new();
    let result = submit_score(&backend, &SessionState::anonymous(), "pacman-clone", "100").await;
    assert_eq!(result, Err(ScoreError::NotSignedIn));
    assert_eq!(backend.write_attempts(), 0);
}

#[tokio::test]
async fn backend_failure_surfaces_message() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let state = SessionState::signed_in(session.access_token, session.user, None);
    backend.fail_writes(Some("score table is read-only"));

    let result = submit_score(&backend, &state, "pacman-clone", "100").await;
    assert_eq!(result, Err(ScoreError::Backend("score table is read-only".into())));
}

#[tokio::test]
async fn load_leaderboard_ranks_backend_rows() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let state = SessionState::signed_in(session.access_token, session.user, None);
    for raw in ["300", "100", "200"] {
        submit_score(&backend, &state, "pacman-clone", raw)
            .await
            .unwrap();
    }
    submit_score(&backend, &state, "snake-classic", "999")
        .await
        .unwrap();

    let board = load_leaderboard(&backend, &catalog(), &LeaderboardFilter::Game("pacman-clone".into()))
        .await
        .unwrap();
    let scores: Vec<i64> = board.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![300, 200, 100]);
    assert_eq!(board[0].username, "ada");
}
