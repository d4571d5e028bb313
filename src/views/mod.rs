//! Views — Leptos components rendered to HTML on the server.
//!
//! DESIGN
//! ======
//! Every page is a Leptos component tree rendered to a string inside a
//! fresh reactive root owner, so nothing reactive outlives the request.
//! Handlers pass owned, already-settled data in; views never call the
//! backend and never see an unresolved session.
//!
//! The only browser-side behavior (busy buttons, the Flash emulator mount,
//! live comment updates) lives in `static/arcade.js`, keyed off `data-*`
//! attributes emitted here.

pub mod auth;
pub mod comments;
pub mod game;
pub mod home;
pub mod info;
pub mod layout;
pub mod leaderboard;

use leptos::prelude::*;
use time::OffsetDateTime;
use time::macros::format_description;

/// Render a view tree to HTML inside its own reactive owner.
pub fn render<V, F>(view: F) -> String
where
    V: IntoView + 'static,
    F: FnOnce() -> V,
{
    let owner = Owner::new_root(None);
    owner.with(|| view().to_html())
}

/// `2024-05-01`
pub(crate) fn format_date(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// `2024-05-01 12:34 UTC`
pub(crate) fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.to_offset(time::UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
