//! High scores page.

use leptos::prelude::*;

use super::layout::Layout;
use super::{format_date, render};
use crate::catalog::Catalog;
use crate::services::scores::{LeaderboardFilter, RankedScore};

/// Loaded leaderboard, or the message to show instead.
pub type Board = Result<Vec<RankedScore>, String>;

#[must_use]
pub fn render_leaderboard_page(
    catalog: &Catalog,
    filter: LeaderboardFilter,
    board: Board,
    welcome: Option<String>,
) -> String {
    let options: Vec<(String, String)> = catalog
        .games()
        .iter()
        .map(|g| (g.id.clone(), g.name.clone()))
        .collect();
    render(move || {
        view! {
            <Layout title="High Scores" welcome=welcome>
                <LeaderboardPage filter=filter board=board options=options/>
            </Layout>
        }
    })
}

#[component]
fn LeaderboardPage(filter: LeaderboardFilter, board: Board, options: Vec<(String, String)>) -> impl IntoView {
    let show_game = filter == LeaderboardFilter::All;
    let current = filter.param().to_owned();
    let options = options
        .into_iter()
        .map(|(id, name)| {
            let selected = id == current;
            view! { <option value=id selected=selected>{name}</option> }
        })
        .collect_view();

    let body = match board {
        Err(message) => view! { <p class="board__message form-error">{message}</p> }.into_any(),
        Ok(rows) if rows.is_empty() => view! {
            <p class="board__message">"No scores found for this game. Be the first to set a record!"</p>
        }
        .into_any(),
        Ok(rows) => view! { <ScoreTable rows=rows show_game=show_game/> }.into_any(),
    };

    view! {
        <section class="panel board">
            <div class="board__header">
                <h1>"High Scores"</h1>
                <form class="board__filter" method="get" action="/high-scores" data-autosubmit="true">
                    <label>
                        "Filter by game: "
                        <select name="game">
                            <option value="all" selected=show_game>"All Games"</option>
                            {options}
                        </select>
                    </label>
                    <noscript><button class="button button--small" type="submit">"Show"</button></noscript>
                </form>
            </div>
            {body}
        </section>
    }
}

#[component]
fn ScoreTable(rows: Vec<RankedScore>, show_game: bool) -> impl IntoView {
    let rows = rows
        .into_iter()
        .map(|row| {
            let trophy = row
                .medal()
                .map(|m| view! { <span class=format!("trophy {}", m.class()) aria-hidden="true">"🏆"</span> });
            let game = show_game.then(|| view! { <td class="board__game">{row.game_name.clone()}</td> });
            view! {
                <tr>
                    <td class="board__rank">{trophy}{row.rank.to_string()}</td>
                    <td class="board__player">{row.username.clone()}</td>
                    {game}
                    <td class="board__score">{row.formatted_score()}</td>
                    <td class="board__date">{format_date(row.created_at)}</td>
                </tr>
            }
        })
        .collect_view();

    view! {
        <table class="board__table">
            <thead>
                <tr>
                    <th>"Rank"</th>
                    <th>"Player"</th>
                    {show_game.then(|| view! { <th>"Game"</th> })}
                    <th>"Score"</th>
                    <th>"Date"</th>
                </tr>
            </thead>
            <tbody>{rows}</tbody>
        </table>
    }
}

#[cfg(test)]
#[path = "leaderboard_test.rs"]
mod tests;
