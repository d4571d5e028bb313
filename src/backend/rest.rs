//! Hosted backend client — REST tables, auth endpoints, realtime channels.
//!
//! Thin HTTP wrapper over the service's `/rest/v1` (table reads and inserts)
//! and `/auth/v1` (password auth) surfaces. Query construction and response
//! parsing are pure functions so they can be tested without a network.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::config::BackendConfig;
use super::realtime::{ChannelSpec, RealtimeClient};
use super::{
    AuthSession, Backend, BackendError, Comment, HighScore, NewComment, NewHighScore, Profile, ScoreQuery,
    SignUpOutcome, Subscription, User,
};

const COMMENTS_TABLE: &str = "comments";
const HIGH_SCORES_TABLE: &str = "high_scores";
const PROFILES_TABLE: &str = "profiles";

/// Column list joining the submitter's username onto a row.
const SELECT_WITH_USERNAME: &str = "*,profiles(username)";

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestBackend {
    http: reqwest::Client,
    config: BackendConfig,
    realtime: RealtimeClient,
}

impl RestBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        let realtime = RealtimeClient::new(config.realtime_url(), config.anon_key.clone());
        Ok(Self { http, config, realtime })
    }

    /// Base request with the API key, authorized as `bearer` or anonymously.
    fn request(&self, method: Method, url: String, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {token}"))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let body = execute(
            self.request(Method::GET, self.config.rest_url(table), None)
                .query(params),
        )
        .await?;
        parse_rows(&body)
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        access_token: &str,
        row: &T,
    ) -> Result<(), BackendError> {
        execute(
            self.request(Method::POST, self.config.rest_url(table), Some(access_token))
                .header("Prefer", "return=minimal")
                .json(row),
        )
        .await?;
        Ok(())
    }
}

/// Send a request, returning the body on 2xx and a parsed error otherwise.
async fn execute(req: RequestBuilder) -> Result<String, BackendError> {
    let response = req
        .send()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Request(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(parse_api_error(status, &text));
    }
    Ok(text)
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let body = execute(
            self.request(Method::POST, self.config.auth_url("token"), None)
                .query(&[("grant_type", "password")])
                .json(&serde_json::json!({ "email": email, "password": password })),
        )
        .await?;
        parse_session(&body)
    }

    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome, BackendError> {
        let body = execute(
            self.request(Method::POST, self.config.auth_url("signup"), None)
                .json(&serde_json::json!({
                    "email": email,
                    "password": password,
                    "data": { "username": username },
                })),
        )
        .await?;
        parse_sign_up(&body)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let result = execute(
            self.request(Method::POST, self.config.auth_url("token"), None)
                .query(&[("grant_type", "refresh_token")])
                .json(&serde_json::json!({ "refresh_token": refresh_token })),
        )
        .await;
        match result {
            Ok(body) => parse_session(&body),
            Err(e) => Err(refresh_error(e)),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<User, BackendError> {
        let result = execute(self.request(Method::GET, self.config.auth_url("user"), Some(access_token))).await;
        match result {
            Ok(body) => serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string())),
            Err(BackendError::Api { status: 401 | 403, .. }) => Err(BackendError::Unauthorized),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        execute(self.request(Method::POST, self.config.auth_url("logout"), Some(access_token))).await?;
        Ok(())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let rows: Vec<Profile> = self
            .select(PROFILES_TABLE, &profile_params(user_id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_comments(&self, game_id: &str) -> Result<Vec<Comment>, BackendError> {
        self.select(COMMENTS_TABLE, &comments_params(game_id))
            .await
    }

    async fn insert_comment(&self, access_token: &str, comment: &NewComment) -> Result<(), BackendError> {
        self.insert(COMMENTS_TABLE, access_token, comment)
            .await
    }

    async fn list_high_scores(&self, query: &ScoreQuery) -> Result<Vec<HighScore>, BackendError> {
        self.select(HIGH_SCORES_TABLE, &scores_params(query))
            .await
    }

    async fn insert_high_score(&self, access_token: &str, score: &NewHighScore) -> Result<(), BackendError> {
        self.insert(HIGH_SCORES_TABLE, access_token, score)
            .await
    }

    async fn subscribe_comments(&self, game_id: &str) -> Result<Subscription, BackendError> {
        self.realtime
            .subscribe(ChannelSpec::comment_inserts(game_id))
            .await
    }
}

// =============================================================================
// QUERY CONSTRUCTION
// =============================================================================

fn comments_params(game_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("select", SELECT_WITH_USERNAME.to_owned()),
        ("game_id", format!("eq.{game_id}")),
        ("order", "created_at.desc".to_owned()),
    ]
}

fn scores_params(query: &ScoreQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", SELECT_WITH_USERNAME.to_owned()),
        ("order", "score.desc".to_owned()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(game_id) = &query.game_id {
        params.push(("game_id", format!("eq.{game_id}")));
    }
    params
}

fn profile_params(user_id: Uuid) -> Vec<(&'static str, String)> {
    vec![("select", "id,username".to_owned()), ("id", format!("eq.{user_id}"))]
}

// =============================================================================
// PARSING
// =============================================================================

/// Turn an error response into a `BackendError`, keeping the backend's text.
fn parse_api_error(status: u16, body: &str) -> BackendError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(serde_json::Value::as_str).map(str::to_owned))
        });
    let message = from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| format!("request failed with status {status}"));
    BackendError::Api { status, message }
}

/// GoTrue answers an unknown or already-used refresh token with 400.
fn refresh_error(err: BackendError) -> BackendError {
    match err {
        BackendError::Api { status: 400 | 401 | 403, .. } => BackendError::Unauthorized,
        other => other,
    }
}

fn parse_session(body: &str) -> Result<AuthSession, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Sign-up answers with a session (auto-confirm), or with a bare user whose
/// `identities` list is empty when the email is already registered.
fn parse_sign_up(body: &str) -> Result<SignUpOutcome, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))?;
    if value.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(value).map_err(|e| BackendError::Parse(e.to_string()))?;
        return Ok(SignUpOutcome::SignedIn(session));
    }

    let user = value.get("user").unwrap_or(&value);
    let no_identities = user
        .get("identities")
        .and_then(serde_json::Value::as_array)
        .is_some_and(Vec::is_empty);
    if no_identities {
        Ok(SignUpOutcome::AlreadyRegistered)
    } else {
        Ok(SignUpOutcome::ConfirmationRequired)
    }
}

fn parse_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
