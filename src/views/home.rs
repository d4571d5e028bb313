//! Home page: the catalog grouped by category.

use leptos::prelude::*;

use super::layout::Layout;
use super::render;
use crate::catalog::{Catalog, Category, Game};

#[must_use]
pub fn render_home_page(catalog: &Catalog, selected: Option<Category>, welcome: Option<String>) -> String {
    let sections: Vec<(Category, Vec<Game>)> = catalog
        .grouped()
        .into_iter()
        .filter(|(category, _)| selected.is_none_or(|s| s == *category))
        .map(|(category, games)| (category, games.into_iter().cloned().collect()))
        .collect();
    let present: Vec<Category> = catalog
        .grouped()
        .into_iter()
        .map(|(category, _)| category)
        .collect();

    render(move || {
        view! {
            <Layout title="Home" welcome=welcome>
                <HomePage sections=sections categories=present selected=selected/>
            </Layout>
        }
    })
}

#[component]
fn HomePage(
    sections: Vec<(Category, Vec<Game>)>,
    categories: Vec<Category>,
    selected: Option<Category>,
) -> impl IntoView {
    let empty = sections.is_empty();
    let filter = categories
        .into_iter()
        .map(|category| {
            let class = if selected == Some(category) { "chip chip--active" } else { "chip" };
            view! { <a class=class href=format!("/?category={}", category.slug())>{category.label()}</a> }
        })
        .collect_view();
    let all_class = if selected.is_none() { "chip chip--active" } else { "chip" };

    let sections = sections
        .into_iter()
        .map(|(category, games)| {
            let cards = games
                .into_iter()
                .map(|game| view! { <GameCard game=game/> })
                .collect_view();
            view! {
                <section class="category" id=category.slug()>
                    <h2 class="category__title">{format!("{category} Games")}</h2>
                    <div class="card-grid">{cards}</div>
                </section>
            }
        })
        .collect_view();

    view! {
        <section class="panel hero">
            <h1>"Welcome to Retro Arkade!"</h1>
            <p>
                "Your one-stop portal for the best classic Flash and HTML5 games from the golden era of web gaming. "
                "Log in to save your high scores and join the community!"
            </p>
        </section>
        <nav class="category-filter">
            <a class=all_class href="/">"All"</a>
            {filter}
        </nav>
        {sections}
        {empty.then(|| view! { <p class="empty">"No games in this category yet."</p> })}
    }
}

#[component]
fn GameCard(game: Game) -> impl IntoView {
    let href = game.detail_href();
    let thumb = game
        .thumbnail
        .clone()
        .map(|src| view! { <img class="card__thumb" src=src alt=game.name.clone()/> });
    view! {
        <a class="card" href=href>
            <div class="card__media">{thumb}</div>
            <h3 class="card__title">{game.name}</h3>
        </a>
    }
}

#[cfg(test)]
#[path = "home_test.rs"]
mod tests;
