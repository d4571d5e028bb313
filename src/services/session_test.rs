use super::*;
use crate::backend::memory::MemoryBackend;

fn cookie_value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(Cookie::value)
}

// =============================================================================
// STATE
// =============================================================================

#[test]
fn loading_state_cannot_submit() {
    let mut state = SessionState { loading: true, ..SessionState::default() };
    assert!(state.loading);
    assert!(!state.is_signed_in());
    state.access_token = Some("tok".into());
    assert!(!state.can_submit());
}

#[test]
fn anonymous_state_is_settled() {
    let state = SessionState::anonymous();
    assert!(!state.loading);
    assert!(!state.can_submit());
    assert!(state.display_name().is_none());
}

#[test]
fn display_name_prefers_profile() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada_meta");
    let user = session.user.clone();

    let without_profile = SessionState::signed_in("t".into(), user.clone(), None);
    assert_eq!(without_profile.display_name(), Some("ada_meta"));

    let profile = Profile { id: user.id, username: "ada".into() };
    let with_profile = SessionState::signed_in("t".into(), user.clone(), Some(profile));
    assert_eq!(with_profile.display_name(), Some("ada"));
}

#[test]
fn serialized_state_hides_token() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let state = SessionState::signed_in(session.access_token.clone(), session.user, None);
    let json = serde_json::to_value(&state).unwrap();
    assert!(json.get("access_token").is_none());
    assert_eq!(json["loading"], false);
    assert_eq!(json["user"]["email"], "ada@example.com");
}

// =============================================================================
// RESOLVE
// =============================================================================

#[tokio::test]
async fn resolve_without_token_is_anonymous() {
    let backend = MemoryBackend::new();
    let resolved = resolve(&backend, None, None).await;
    assert_eq!(resolved.state, SessionState::anonymous());
    assert!(!resolved.stale_token);
}

#[tokio::test]
async fn resolve_valid_token_loads_user_and_profile() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let resolved = resolve(&backend, Some(&session.access_token), None).await;
    assert!(resolved.state.can_submit());
    assert_eq!(resolved.state.profile.as_ref().map(|p| p.username.as_str()), Some("ada"));
    assert_eq!(resolved.state.credentials().map(|(_, id)| id), Some(session.user.id));
}

#[tokio::test]
async fn resolve_rejected_token_marks_stale() {
    let backend = MemoryBackend::new();
    let resolved = resolve(&backend, Some("expired"), None).await;
    assert!(!resolved.state.is_signed_in());
    assert!(resolved.stale_token);
}

#[tokio::test]
async fn resolve_renews_from_refresh_token_after_access_expiry() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let jar = store_tokens(CookieJar::new(), &session, false);
    backend.expire_access_token(&session.access_token);
    let jar = jar.remove(Cookie::build(ACCESS_COOKIE).path("/"));

    let resolved = resolve(&backend, access_token(&jar), refresh_token(&jar)).await;
    assert!(resolved.state.can_submit());
    assert_eq!(resolved.state.display_name(), Some("ada"));
    assert!(!resolved.stale_token);

    let renewed = resolved.renewed.expect("renewed session");
    assert_ne!(renewed.access_token, session.access_token);
    assert_eq!(resolved.state.access_token.as_deref(), Some(renewed.access_token.as_str()));
    assert_eq!(backend.get_user(&renewed.access_token).await.unwrap().id, session.user.id);
}

#[tokio::test]
async fn resolve_rejected_access_falls_back_to_refresh() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    backend.expire_access_token(&session.access_token);

    let resolved = resolve(&backend, Some(&session.access_token), session.refresh_token.as_deref()).await;
    assert!(resolved.state.is_signed_in());
    assert!(resolved.renewed.is_some());
}

#[tokio::test]
async fn resolve_spent_refresh_token_marks_stale() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let refresh = session.refresh_token.as_deref();
    assert!(resolve(&backend, None, refresh).await.renewed.is_some());

    let resolved = resolve(&backend, None, refresh).await;
    assert!(!resolved.state.is_signed_in());
    assert!(resolved.stale_token);
    assert!(resolved.renewed.is_none());
}

#[tokio::test]
async fn resolve_valid_access_does_not_spend_refresh() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let resolved = resolve(&backend, Some(&session.access_token), session.refresh_token.as_deref()).await;
    assert!(resolved.state.is_signed_in());
    assert!(resolved.renewed.is_none());
}

#[tokio::test]
async fn resolve_survives_profile_failure() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    backend.fail_reads(Some("profiles unavailable"));
    let resolved = resolve(&backend, Some(&session.access_token), None).await;
    assert!(resolved.state.is_signed_in());
    assert!(resolved.state.profile.is_none());
}

// =============================================================================
// COOKIES
// =============================================================================

#[tokio::test]
async fn store_and_read_tokens() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let jar = store_tokens(CookieJar::new(), &session, true);

    assert_eq!(access_token(&jar), Some(session.access_token.as_str()));
    assert_eq!(cookie_value(&jar, REFRESH_COOKIE), session.refresh_token.as_deref());

    let cookie = jar.get(ACCESS_COOKIE).unwrap();
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
}

#[tokio::test]
async fn sign_out_revokes_and_clears() {
    let backend = MemoryBackend::new();
    let session = backend.seed_user("ada@example.com", "secret1", "ada");
    let jar = store_tokens(CookieJar::new(), &session, false);

    let jar = sign_out(&backend, jar).await;
    assert!(access_token(&jar).is_none());
    assert!(refresh_token(&jar).is_none());
    assert!(backend.get_user(&session.access_token).await.is_err());
    assert!(resolve(&backend, None, session.refresh_token.as_deref()).await.stale_token);
}

#[tokio::test]
async fn sign_out_without_cookie_is_harmless() {
    let backend = MemoryBackend::new();
    let jar = sign_out(&backend, CookieJar::new()).await;
    assert!(access_token(&jar).is_none());
}
