use super::*;

fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

// =============================================================================
// QUERY CONSTRUCTION
// =============================================================================

#[test]
fn comments_query_filters_joins_and_orders() {
    let params = comments_params("pacman-clone");
    assert_eq!(param(&params, "select"), Some("*,profiles(username)"));
    assert_eq!(param(&params, "game_id"), Some("eq.pacman-clone"));
    assert_eq!(param(&params, "order"), Some("created_at.desc"));
}

#[test]
fn scores_query_unfiltered() {
    let params = scores_params(&ScoreQuery { game_id: None, limit: 100 });
    assert_eq!(param(&params, "order"), Some("score.desc"));
    assert_eq!(param(&params, "limit"), Some("100"));
    assert!(param(&params, "game_id").is_none());
}

#[test]
fn scores_query_filtered() {
    let params = scores_params(&ScoreQuery { game_id: Some("snake-classic".into()), limit: 100 });
    assert_eq!(param(&params, "game_id"), Some("eq.snake-classic"));
    assert_eq!(param(&params, "select"), Some("*,profiles(username)"));
}

#[test]
fn profile_query_by_id() {
    let id = Uuid::nil();
    let params = profile_params(id);
    assert_eq!(param(&params, "id"), Some("eq.00000000-0000-0000-0000-000000000000"));
    assert_eq!(param(&params, "select"), Some("id,username"));
}

// =============================================================================
// ERROR PARSING
// =============================================================================

#[test]
fn api_error_prefers_backend_message_fields() {
    let err = parse_api_error(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#);
    assert!(matches!(&err, BackendError::Api { status: 400, message } if message == "Invalid login credentials"));

    let err = parse_api_error(422, r#"{"code":"weak_password","msg":"Password should be at least 6 characters"}"#);
    assert_eq!(err.user_message(), "Password should be at least 6 characters");

    let err = parse_api_error(
        403,
        r#"{"code":"42501","message":"new row violates row-level security policy for table \"comments\""}"#,
    );
    assert_eq!(
        err.user_message(),
        "new row violates row-level security policy for table \"comments\""
    );
}

#[test]
fn api_error_plain_text_body() {
    let err = parse_api_error(502, "Bad Gateway");
    assert!(matches!(&err, BackendError::Api { status: 502, message } if message == "Bad Gateway"));
}

#[test]
fn api_error_empty_body_uses_status() {
    let err = parse_api_error(500, "");
    assert_eq!(err.user_message(), "request failed with status 500");
}

#[test]
fn api_error_retryable_on_5xx_only() {
    use crate::frame::ErrorCode;
    assert!(parse_api_error(503, "").retryable());
    assert!(!parse_api_error(400, "").retryable());
}

// =============================================================================
// SESSION / SIGN-UP PARSING
// =============================================================================

const USER_JSON: &str = r#"{"id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","email":"ada@example.com","user_metadata":{"username":"ada"}}"#;

#[test]
fn parse_session_reads_tokens_and_user() {
    let body = format!(
        r#"{{"access_token":"at","token_type":"bearer","expires_in":3600,"refresh_token":"rt","user":{USER_JSON}}}"#
    );
    let session = parse_session(&body).unwrap();
    assert_eq!(session.access_token, "at");
    assert_eq!(session.refresh_token.as_deref(), Some("rt"));
    assert_eq!(session.expires_in, Some(3600));
    assert_eq!(session.user.metadata_username(), Some("ada"));
}

#[test]
fn parse_session_rejects_garbage() {
    assert!(matches!(parse_session("{}"), Err(BackendError::Parse(_))));
}

#[test]
fn sign_up_with_session_is_signed_in() {
    let body = format!(r#"{{"access_token":"at","refresh_token":"rt","user":{USER_JSON}}}"#);
    assert!(matches!(parse_sign_up(&body).unwrap(), SignUpOutcome::SignedIn(s) if s.access_token == "at"));
}

#[test]
fn sign_up_empty_identities_is_already_registered() {
    let body = r#"{"id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","email":"ada@example.com","identities":[]}"#;
    assert_eq!(parse_sign_up(body).unwrap(), SignUpOutcome::AlreadyRegistered);
}

#[test]
fn sign_up_with_identities_needs_confirmation() {
    let body = r#"{"id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","identities":[{"provider":"email"}]}"#;
    assert_eq!(parse_sign_up(body).unwrap(), SignUpOutcome::ConfirmationRequired);
}

#[test]
fn sign_up_nested_user_shape() {
    let body = r#"{"user":{"id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","identities":[]},"session":null}"#;
    assert_eq!(parse_sign_up(body).unwrap(), SignUpOutcome::AlreadyRegistered);
}

// =============================================================================
// ROW PARSING
// =============================================================================

#[test]
fn parse_comment_rows_with_joined_username() {
    let body = r#"[
        {"id":2,"game_id":"pacman-clone","user_id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","content":"gg","created_at":"2024-05-01T12:34:56.789012+00:00","profiles":{"username":"ada"}},
        {"id":1,"game_id":"pacman-clone","user_id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","content":"first","created_at":"2024-05-01T10:00:00+00:00","profiles":null}
    ]"#;
    let rows: Vec<Comment> = parse_rows(body).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].username(), "ada");
    assert_eq!(rows[1].username(), crate::backend::ANONYMOUS);
    assert!(rows[0].created_at > rows[1].created_at);
    assert_eq!(rows[0].id, crate::backend::RowId::Int(2));
}

#[test]
fn parse_rows_accepts_uuid_keys() {
    let body = r#"[{"id":"5b7c1f1e-0d7e-4f43-9a55-2c1a8f0e6b11","game_id":"snake-classic","user_id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","score":42,"created_at":"2024-05-01T10:00:00Z"}]"#;
    let rows: Vec<HighScore> = parse_rows(body).unwrap();
    assert_eq!(rows[0].id.to_string(), "5b7c1f1e-0d7e-4f43-9a55-2c1a8f0e6b11");
    assert_eq!(rows[0].score, 42);
}

#[test]
fn parse_score_rows() {
    let body = r#"[{"id":7,"game_id":"snake-classic","user_id":"8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e","score":15000,"created_at":"2024-05-01T10:00:00Z","profiles":{"username":"ada"}}]"#;
    let rows: Vec<HighScore> = parse_rows(body).unwrap();
    assert_eq!(rows[0].score, 15000);
    assert_eq!(rows[0].username(), "ada");
}

#[test]
fn parse_rows_rejects_object_body() {
    let result: Result<Vec<Comment>, _> = parse_rows(r#"{"message":"nope"}"#);
    assert!(matches!(result, Err(BackendError::Parse(_))));
}

#[test]
fn refresh_rejection_maps_to_unauthorized() {
    let spent = parse_api_error(400, r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Already Used"}"#);
    assert!(matches!(refresh_error(spent), BackendError::Unauthorized));

    let outage = parse_api_error(503, "upstream unavailable");
    assert!(matches!(refresh_error(outage), BackendError::Api { status: 503, .. }));
}
