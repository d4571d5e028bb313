//! Session provider — who is visiting, resolved from cookies.
//!
//! ARCHITECTURE
//! ============
//! The backend issues an access token at sign-in. We keep it, with the
//! refresh token, in `HttpOnly` cookies and resolve it to a user + profile
//! before any view renders. Views only ever see a settled [`SessionState`].
//! Once the access cookie lapses the refresh token opens a new session and
//! both cookies are re-issued.
//!
//! TRADE-OFFS
//! ==========
//! A backend outage during resolution degrades to "anonymous" rather than
//! failing the page; the cookies are kept so the next request can retry.
//! Only a token the backend explicitly rejects gets its cookies cleared.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::{AuthSession, Backend, BackendError, Profile, User};

pub const ACCESS_COOKIE: &str = "arcade_access";
pub const REFRESH_COOKIE: &str = "arcade_refresh";

const ACCESS_TTL_FALLBACK_SECS: i64 = 3600;
const REFRESH_TTL_DAYS: i64 = 30;

// =============================================================================
// STATE
// =============================================================================

/// `{session, user, profile, loading}` for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    #[serde(skip)]
    pub access_token: Option<String>,
    pub user: Option<User>,
    pub profile: Option<Profile>,
    /// `true` until resolution has run. Nothing should branch on
    /// `user`/`profile` while this is set.
    pub loading: bool,
}

impl SessionState {
    /// Settled, nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(access_token: String, user: User, profile: Option<Profile>) -> Self {
        Self { access_token: Some(access_token), user: Some(user), profile, loading: false }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        !self.loading && self.user.is_some()
    }

    /// Whether insert controls (comment box, score form) may be offered.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.credentials().is_some()
    }

    /// Access token and user id for an insert on this visitor's behalf.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, Uuid)> {
        if self.loading {
            return None;
        }
        match (&self.access_token, &self.user) {
            (Some(token), Some(user)) => Some((token.as_str(), user.id)),
            _ => None,
        }
    }

    /// Name for the header greeting: profile, then sign-up metadata, then email.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        if let Some(profile) = &self.profile {
            return Some(profile.username.as_str());
        }
        let user = self.user.as_ref()?;
        user.metadata_username()
            .or(user.email.as_deref())
    }
}

/// A settled session plus what should happen to the token cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub state: SessionState,
    /// The presented tokens were rejected and should be forgotten.
    pub stale_token: bool,
    /// A session opened from the refresh token; its tokens replace the cookies.
    pub renewed: Option<AuthSession>,
}

impl Resolved {
    fn anonymous(stale_token: bool) -> Self {
        Self { state: SessionState::anonymous(), stale_token, renewed: None }
    }
}

/// Settle the session for the visitor's token cookies.
///
/// A missing or rejected access token falls back to the refresh token, so a
/// visitor stays signed in past the access token's lifetime.
pub async fn resolve(backend: &dyn Backend, access_token: Option<&str>, refresh_token: Option<&str>) -> Resolved {
    let refresh_token = refresh_token.filter(|t| !t.is_empty());

    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        match backend.get_user(token).await {
            Ok(user) => {
                let profile = load_profile(backend, &user).await;
                return Resolved {
                    state: SessionState::signed_in(token.to_owned(), user, profile),
                    stale_token: false,
                    renewed: None,
                };
            }
            Err(BackendError::Unauthorized) => {
                debug!("session: access token rejected");
                if refresh_token.is_none() {
                    return Resolved::anonymous(true);
                }
            }
            Err(e) => {
                warn!(error = %e, "session: backend unavailable; treating visitor as anonymous");
                return Resolved::anonymous(false);
            }
        }
    }

    let Some(refresh) = refresh_token else {
        return Resolved::anonymous(false);
    };

    match backend.refresh_session(refresh).await {
        Ok(auth) => {
            debug!(user_id = %auth.user.id, "session: renewed from refresh token");
            let profile = load_profile(backend, &auth.user).await;
            let state = SessionState::signed_in(auth.access_token.clone(), auth.user.clone(), profile);
            Resolved { state, stale_token: false, renewed: Some(auth) }
        }
        Err(BackendError::Unauthorized) => {
            debug!("session: refresh token rejected");
            Resolved::anonymous(true)
        }
        Err(e) => {
            warn!(error = %e, "session: refresh failed; treating visitor as anonymous");
            Resolved::anonymous(false)
        }
    }
}

async fn load_profile(backend: &dyn Backend, user: &User) -> Option<Profile> {
    match backend.fetch_profile(user.id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(user_id = %user.id, error = %e, "session: profile fetch failed");
            None
        }
    }
}

// =============================================================================
// COOKIES
// =============================================================================

#[must_use]
pub fn access_token(jar: &CookieJar) -> Option<&str> {
    jar.get(ACCESS_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn refresh_token(jar: &CookieJar) -> Option<&str> {
    jar.get(REFRESH_COOKIE)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
}

/// Add both token cookies for a freshly opened session.
#[must_use]
pub fn store_tokens(jar: CookieJar, session: &AuthSession, secure: bool) -> CookieJar {
    let access_ttl = session
        .expires_in
        .and_then(|secs| i64::try_from(secs).ok())
        .unwrap_or(ACCESS_TTL_FALLBACK_SECS);
    let access = token_cookie(ACCESS_COOKIE, session.access_token.clone(), secure, Duration::seconds(access_ttl));
    let jar = jar.add(access);
    match &session.refresh_token {
        Some(refresh) => {
            let refresh = token_cookie(REFRESH_COOKIE, refresh.clone(), secure, Duration::days(REFRESH_TTL_DAYS));
            jar.add(refresh)
        }
        None => jar,
    }
}

#[must_use]
pub fn clear_tokens(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

fn token_cookie(name: &'static str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Revoke the session upstream and forget the tokens locally.
///
/// An upstream failure is logged and ignored: the visitor is signed out of
/// this site either way.
pub async fn sign_out(backend: &dyn Backend, jar: CookieJar) -> CookieJar {
    if let Some(token) = access_token(&jar)
        && let Err(e) = backend.sign_out(token).await
    {
        warn!(error = %e, "session: backend sign-out failed");
    }
    clear_tokens(jar)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
