//! Login and sign-up pages.

use leptos::prelude::*;

use super::layout::Layout;
use super::render;
use crate::services::auth::{FormState, LoginForm, MIN_PASSWORD_LEN, SignUpForm};

#[must_use]
pub fn render_login_page(form: &LoginForm, state: FormState) -> String {
    let email = form.email.clone();
    render(move || {
        view! {
            <Layout title="Login" welcome=None>
                <section class="panel auth">
                    <h1>"Welcome Back!"</h1>
                    <p class="auth__lead">"Sign in to continue your adventure."</p>
                    <form class="auth__form" method="post" action="/login" data-busy-form="true">
                        <label class="field">
                            <span>"Email"</span>
                            <input class="input" type="email" name="email" value=email required/>
                        </label>
                        <label class="field">
                            <span>"Password"</span>
                            <input class="input" type="password" name="password" required/>
                        </label>
                        <StateMessage state=state/>
                        <button
                            class="button button--primary button--wide"
                            type="submit"
                            data-busy-label="Logging in..."
                        >
                            "Login"
                        </button>
                    </form>
                    <p class="auth__switch">"Don't have an account? " <a href="/signup">"Sign up"</a></p>
                </section>
            </Layout>
        }
    })
}

#[must_use]
pub fn render_signup_page(form: &SignUpForm, state: FormState) -> String {
    let username = form.username.clone();
    let email = form.email.clone();
    let minlength = MIN_PASSWORD_LEN.to_string();
    render(move || {
        view! {
            <Layout title="Sign Up" welcome=None>
                <section class="panel auth">
                    <h1>"Create Your Account"</h1>
                    <p class="auth__lead">"Join the community and start saving your scores!"</p>
                    <form class="auth__form" method="post" action="/signup" data-busy-form="true">
                        <label class="field">
                            <span>"Username"</span>
                            <input class="input" type="text" name="username" value=username required/>
                        </label>
                        <label class="field">
                            <span>"Email"</span>
                            <input class="input" type="email" name="email" value=email required/>
                        </label>
                        <label class="field">
                            <span>"Password"</span>
                            <input class="input" type="password" name="password" minlength=minlength required/>
                        </label>
                        <StateMessage state=state/>
                        <button
                            class="button button--primary button--wide"
                            type="submit"
                            data-busy-label="Creating account..."
                        >
                            "Sign Up"
                        </button>
                    </form>
                    <p class="auth__switch">"Already have an account? " <a href="/login">"Log in"</a></p>
                </section>
            </Layout>
        }
    })
}

#[component]
fn StateMessage(state: FormState) -> impl IntoView {
    match state {
        FormState::Error(msg) => Some(view! { <p class="form-error" role="alert">{msg}</p> }.into_any()),
        FormState::Success(msg) => Some(view! { <p class="form-success" role="status">{msg}</p> }.into_any()),
        FormState::Idle => None,
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
