//! Static pages: about, contact, not found.

use leptos::prelude::*;

use super::layout::Layout;
use super::render;

pub const CONTACT_EMAIL: &str = "contact@retroarkade.com";
pub const SUBMISSIONS_EMAIL: &str = "games@retroarkade.com";

#[must_use]
pub fn render_about_page(welcome: Option<String>) -> String {
    render(move || {
        view! {
            <Layout title="About Us" welcome=welcome>
                <section class="panel prose">
                    <h1>"About Retro Arkade"</h1>
                    <p>
                        "Welcome to Retro Arkade, your portal to the past! We preserve and celebrate the golden age "
                        "of internet gaming: one easy place to play the classic Flash and HTML5 games that defined "
                        "a generation."
                    </p>
                    <p>
                        "With Flash retired, many of those gems became hard to find and harder to run. The Ruffle "
                        "emulator brings them back to life in any modern browser without plugins, next to a curated "
                        "selection of HTML5 games."
                    </p>
                    <p>
                        "Retro Arkade is also a community. Create an account to post comments, compete for the top "
                        "spot on the high score leaderboards, and share the nostalgia with fellow gamers."
                    </p>
                    <p>"Thanks for visiting, and have fun!"</p>
                </section>
            </Layout>
        }
    })
}

#[must_use]
pub fn render_contact_page(welcome: Option<String>) -> String {
    render(move || {
        view! {
            <Layout title="Contact" welcome=welcome>
                <section class="panel prose">
                    <h1>"Contact Us"</h1>
                    <p>"Have a question, suggestion, or a game you'd love to see added? We'd love to hear from you!"</p>
                    <h2>"General Inquiries"</h2>
                    <p><a href=format!("mailto:{CONTACT_EMAIL}")>{CONTACT_EMAIL}</a></p>
                    <h2>"Game Submissions"</h2>
                    <p><a href=format!("mailto:{SUBMISSIONS_EMAIL}")>{SUBMISSIONS_EMAIL}</a></p>
                    <p>"We are a small team, but we try to answer every message within a few business days."</p>
                </section>
            </Layout>
        }
    })
}

#[must_use]
pub fn render_not_found_page(welcome: Option<String>) -> String {
    render(move || {
        view! {
            <Layout title="Game Not Found" welcome=welcome>
                <section class="panel not-found">
                    <h1>"Game Not Found"</h1>
                    <p>"We couldn't find the game you're looking for."</p>
                    <a class="button button--primary" href="/">"Back to Home"</a>
                </section>
            </Layout>
        }
    })
}

#[cfg(test)]
#[path = "info_test.rs"]
mod tests;
