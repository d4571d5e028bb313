//! Auth routes — login, sign-up, logout, and the session extractor.

use std::convert::Infallible;

use axum::Form;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::services::auth::{self as auth_svc, AuthFormError, FormState, LoginForm, SignUpForm, SignUpResult};
use crate::services::session::{self, SessionState};
use crate::state::AppState;
use crate::views::auth::{render_login_page, render_signup_page};

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// The visitor's settled session, resolved from the token cookies.
///
/// `jar` carries re-issued cookies after a refresh, or a removal for cookies
/// whose token the backend rejected, so handlers should return it with their
/// response.
pub struct CurrentSession {
    pub state: SessionState,
    pub jar: CookieJar,
}

impl CurrentSession {
    /// Name for the header greeting.
    #[must_use]
    pub fn welcome(&self) -> Option<String> {
        self.state.display_name().map(str::to_owned)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let resolved = session::resolve(
            app_state.backend.as_ref(),
            session::access_token(&jar),
            session::refresh_token(&jar),
        )
        .await;
        let jar = match (&resolved.renewed, resolved.stale_token) {
            (Some(auth), _) => session::store_tokens(jar, auth, app_state.cookie_secure),
            (None, true) => session::clear_tokens(jar),
            (None, false) => jar,
        };
        Ok(Self { state: resolved.state, jar })
    }
}

fn form_status(err: &AuthFormError) -> StatusCode {
    match err {
        AuthFormError::Backend(_) => StatusCode::UNAUTHORIZED,
        AuthFormError::MissingFields | AuthFormError::PasswordTooShort => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login`
pub async fn login_page(current: CurrentSession) -> Response {
    if current.state.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    (current.jar, Html(render_login_page(&LoginForm::default(), FormState::Idle))).into_response()
}

/// `POST /login` — open a session and go home, or re-render with the reason.
pub async fn login(State(state): State<AppState>, current: CurrentSession, Form(form): Form<LoginForm>) -> Response {
    if current.state.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    match auth_svc::sign_in(state.backend.as_ref(), &form).await {
        Ok(auth) => {
            let jar = session::store_tokens(current.jar, &auth, state.cookie_secure);
            (jar, Redirect::to("/")).into_response()
        }
        Err(e) => {
            let page = render_login_page(&form, FormState::Error(e.to_string()));
            (form_status(&e), current.jar, Html(page)).into_response()
        }
    }
}

/// `GET /signup`
pub async fn signup_page(current: CurrentSession) -> Response {
    if current.state.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    (current.jar, Html(render_signup_page(&SignUpForm::default(), FormState::Idle))).into_response()
}

/// `POST /signup` — register; sign in straight away when the backend allows it.
pub async fn signup(State(state): State<AppState>, current: CurrentSession, Form(form): Form<SignUpForm>) -> Response {
    if current.state.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    match auth_svc::sign_up(state.backend.as_ref(), &form).await {
        Ok(SignUpResult::SignedIn(auth)) => {
            let jar = session::store_tokens(current.jar, &auth, state.cookie_secure);
            (jar, Redirect::to("/")).into_response()
        }
        Ok(SignUpResult::Message(message @ FormState::Success(_))) => {
            (current.jar, Html(render_signup_page(&SignUpForm::default(), message))).into_response()
        }
        Ok(SignUpResult::Message(message)) => {
            (StatusCode::CONFLICT, current.jar, Html(render_signup_page(&form, message))).into_response()
        }
        Err(e) => {
            let page = render_signup_page(&form, FormState::Error(e.to_string()));
            (form_status(&e), current.jar, Html(page)).into_response()
        }
    }
}

/// `POST /logout` — revoke the session upstream and forget the cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = session::sign_out(state.backend.as_ref(), jar).await;
    (jar, Redirect::to("/"))
}

/// `GET /api/session` — the settled session for the browser script.
pub async fn session_json(current: CurrentSession) -> impl IntoResponse {
    (current.jar, Json(current.state))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
