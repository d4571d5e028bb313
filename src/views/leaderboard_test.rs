use super::*;
use time::macros::datetime;

fn row(rank: usize, game_id: &str, score: i64) -> RankedScore {
    RankedScore {
        rank,
        username: format!("player{rank}"),
        game_id: game_id.into(),
        game_name: format!("Name of {game_id}"),
        score,
        created_at: datetime!(2024-03-09 10:00 UTC),
    }
}

fn catalog() -> Catalog {
    Catalog::bundled().expect("bundled catalog")
}

#[test]
fn unfiltered_board_shows_game_column_and_medals() {
    let rows = vec![
        row(1, "pacman-clone", 15_000),
        row(2, "snake-classic", 900),
        row(3, "pacman-clone", 800),
        row(4, "pacman-clone", 10),
    ];
    let html = render_leaderboard_page(&catalog(), LeaderboardFilter::All, Ok(rows), None);
    assert!(html.contains("<th>Game</th>"));
    assert!(html.contains("Name of snake-classic"));
    assert!(html.contains("15,000"));
    assert!(html.contains("2024-03-09"));
    for medal in ["medal-gold", "medal-silver", "medal-bronze"] {
        assert!(html.contains(medal), "missing {medal}");
    }
    assert_eq!(html.matches("🏆").count(), 3);
}

#[test]
fn filtered_board_hides_game_column_and_selects_game() {
    let filter = LeaderboardFilter::Game("pacman-clone".into());
    let html = render_leaderboard_page(&catalog(), filter, Ok(vec![row(1, "pacman-clone", 5)]), None);
    assert!(!html.contains("<th>Game</th>"));
    assert!(html.contains(r#"<option value="pacman-clone" selected"#));
    assert!(!html.contains(r#"<option value="all" selected"#));
}

#[test]
fn empty_board_invites_a_record() {
    let html = render_leaderboard_page(&catalog(), LeaderboardFilter::All, Ok(Vec::new()), None);
    assert!(html.contains("No scores found for this game. Be the first to set a record!"));
    assert!(html.contains(r#"<option value="all" selected"#));
}

#[test]
fn load_error_is_shown() {
    let html = render_leaderboard_page(
        &catalog(),
        LeaderboardFilter::All,
        Err("Could not fetch high scores: offline".into()),
        None,
    );
    assert!(html.contains("Could not fetch high scores: offline"));
    assert!(!html.contains("<table"));
}
