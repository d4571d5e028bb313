//! Page shell: document head, header with session controls, footer.

use leptos::prelude::*;

pub const SITE_NAME: &str = "Retro Arkade";

/// Full HTML document around a page body.
#[component]
pub fn Layout(
    #[prop(into)] title: String,
    /// Greeting name when signed in; `None` shows login / sign-up.
    welcome: Option<String>,
    children: Children,
) -> impl IntoView {
    let full_title = format!("{title} | {SITE_NAME}");
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{full_title}</title>
                <link rel="stylesheet" href="/static/arcade.css"/>
                <script src="https://unpkg.com/@ruffle-rs/ruffle" defer></script>
                <script src="/static/arcade.js" defer></script>
            </head>
            <body>
                <Header welcome=welcome/>
                <main class="page">{children()}</main>
                <Footer/>
            </body>
        </html>
    }
}

#[component]
fn Header(welcome: Option<String>) -> impl IntoView {
    let account = match welcome {
        Some(name) => view! {
            <div class="header__account">
                <span class="header__welcome">{format!("Welcome, {name}!")}</span>
                <form method="post" action="/logout" class="header__logout">
                    <button class="button button--secondary button--small" type="submit">"Logout"</button>
                </form>
            </div>
        }
        .into_any(),
        None => view! {
            <div class="header__account">
                <a class="button button--primary button--small" href="/login">"Login"</a>
                <a class="button button--secondary button--small" href="/signup">"Sign Up"</a>
            </div>
        }
        .into_any(),
    };

    view! {
        <header class="header">
            <a class="header__brand" href="/">
                <span class="header__logo" aria-hidden="true">"🎮"</span>
                <span class="header__title">{SITE_NAME}</span>
            </a>
            <nav class="header__nav">
                <a href="/">"Home"</a>
                <a href="/high-scores">"High Scores"</a>
                <span class="header__divider"></span>
                {account}
            </nav>
        </header>
    }
}

#[component]
fn Footer() -> impl IntoView {
    let year = time::OffsetDateTime::now_utc().year();
    view! {
        <footer class="footer">
            <p>{format!("© {year} {SITE_NAME}. All rights reserved.")}</p>
            <nav class="footer__links">
                <a href="/about">"About Us"</a>
                <a href="/contact">"Contact"</a>
            </nav>
        </footer>
    }
}

/// "Log in or sign up" prompt shown in place of an insert control.
#[component]
pub fn LoginPrompt(#[prop(into)] action: String) -> impl IntoView {
    view! {
        <p class="login-prompt">
            <a href="/login">"Log in"</a>
            " or "
            <a href="/signup">"sign up"</a>
            {format!(" to {action}!")}
        </p>
    }
}
