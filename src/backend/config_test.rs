use super::*;

fn config(url: &str) -> BackendConfig {
    BackendConfig::new(url, "anon-key".into(), BackendTimeouts::default()).expect("valid config")
}

#[test]
fn trailing_slash_trimmed() {
    assert_eq!(config("https://abc.example.co/").url, "https://abc.example.co");
}

#[test]
fn rest_and_auth_urls() {
    let cfg = config("https://abc.example.co");
    assert_eq!(cfg.rest_url("comments"), "https://abc.example.co/rest/v1/comments");
    assert_eq!(cfg.auth_url("user"), "https://abc.example.co/auth/v1/user");
}

#[test]
fn realtime_url_uses_wss_for_https() {
    let cfg = config("https://abc.example.co");
    assert_eq!(
        cfg.realtime_url(),
        "wss://abc.example.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
    );
    assert!(cfg.is_https());
}

#[test]
fn realtime_url_uses_ws_for_http() {
    let cfg = config("http://localhost:54321");
    assert!(cfg.realtime_url().starts_with("ws://localhost:54321/realtime/v1/websocket"));
    assert!(!cfg.is_https());
}

#[test]
fn non_http_url_rejected() {
    let err = BackendConfig::new("ftp://nope", "k".into(), BackendTimeouts::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn blank_key_rejected() {
    let err = BackendConfig::new("https://abc.example.co", "  ".into(), BackendTimeouts::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Missing { var } if var == "ARCADE_BACKEND_ANON_KEY"));
}

#[test]
fn default_timeouts() {
    let t = BackendTimeouts::default();
    assert_eq!(t.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(t.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
}
