//! Backend — the hosted database/auth/realtime service this portal consumes.
//!
//! DESIGN
//! ======
//! Persistence, authentication, access policy, and change fan-out all live in
//! a hosted backend-as-a-service. This module only models its client surface:
//! the [`Backend`] trait is the seam, [`rest::RestBackend`] talks to the
//! hosted service over HTTP + WebSocket, and [`memory::MemoryBackend`] is an
//! in-process stand-in for local development and tests.
//!
//! One backend instance is built at startup and shared by every request for
//! the life of the process.

pub mod config;
pub mod memory;
pub mod realtime;
pub mod rest;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Username shown when a row's profile could not be joined.
pub const ANONYMOUS: &str = "Anonymous";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with an error; `message` is its own text.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend answered 2xx but the body was not what we expected.
    #[error("backend response parse failed: {0}")]
    Parse(String),

    /// The access token was rejected.
    #[error("session is invalid or has expired")]
    Unauthorized,

    #[error("realtime channel error: {0}")]
    Realtime(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BackendError {
    /// Human-readable text to place next to the failed control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_owned(),
            Self::Request(_) | Self::Realtime(_) => "Could not reach the game server. Please try again.".to_owned(),
            Self::Parse(_) | Self::HttpClientBuild(_) => "The game server sent an unexpected response.".to_owned(),
        }
    }
}

impl crate::frame::ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_BACKEND_REQUEST",
            Self::Api { .. } => "E_BACKEND_API",
            Self::Parse(_) => "E_BACKEND_PARSE",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Realtime(_) => "E_REALTIME",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Realtime(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// AUTH TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata set at sign-up (carries `username`).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl User {
    /// Username recorded in sign-up metadata, if any.
    #[must_use]
    pub fn metadata_username(&self) -> Option<&str> {
        self.user_metadata
            .get("username")
            .and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The backend auto-confirmed the account and opened a session.
    SignedIn(AuthSession),
    /// A confirmation email was sent; no session yet.
    ConfirmationRequired,
    /// The email already belongs to an account.
    AlreadyRegistered,
}

/// Public profile, 1:1 with an authenticated user. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
}

// =============================================================================
// ROW TYPES
// =============================================================================

/// Primary key of a comment or score row: a bigint identity or a UUID,
/// depending on how the hosted tables were created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Username joined from `profiles` at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileName {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RowId,
    pub game_id: String,
    pub user_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub profiles: Option<ProfileName>,
}

impl Comment {
    #[must_use]
    pub fn username(&self) -> &str {
        joined_username(self.profiles.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScore {
    pub id: RowId,
    pub game_id: String,
    pub user_id: Uuid,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub profiles: Option<ProfileName>,
}

impl HighScore {
    #[must_use]
    pub fn username(&self) -> &str {
        joined_username(self.profiles.as_ref())
    }
}

fn joined_username(profile: Option<&ProfileName>) -> &str {
    profile
        .and_then(|p| p.username.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub content: String,
    pub game_id: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewHighScore {
    pub game_id: String,
    pub user_id: Uuid,
    pub score: i64,
}

/// Read query against `high_scores`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreQuery {
    pub game_id: Option<String>,
    pub limit: usize,
}

// =============================================================================
// REALTIME
// =============================================================================

/// One change notification delivered on a realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotice {
    pub table: String,
    /// The inserted row as the backend described it. Consumers re-fetch
    /// rather than trusting this shape.
    pub record: serde_json::Value,
}

/// A live realtime channel. Dropping it closes the channel.
pub struct Subscription {
    events: mpsc::Receiver<ChangeNotice>,
}

impl Subscription {
    /// Create a subscription and the sender its producer task feeds.
    ///
    /// The producer must stop (and leave the remote channel) once
    /// `Sender::closed()` resolves.
    #[must_use]
    pub fn channel(buffer: usize) -> (mpsc::Sender<ChangeNotice>, Self) {
        let (tx, events) = mpsc::channel(buffer);
        (tx, Self { events })
    }

    /// Wait for the next notification. `None` once the producer has gone away.
    pub async fn next(&mut self) -> Option<ChangeNotice> {
        self.events.recv().await
    }
}

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// Client surface of the hosted backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Register with `username` carried in the sign-up metadata.
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome, BackendError>;

    /// Exchange a refresh token for a new session. A rejected token is
    /// [`BackendError::Unauthorized`].
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    /// Resolve the user behind an access token.
    async fn get_user(&self, access_token: &str) -> Result<User, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError>;

    /// All comments for a game with usernames joined, newest first.
    async fn list_comments(&self, game_id: &str) -> Result<Vec<Comment>, BackendError>;

    async fn insert_comment(&self, access_token: &str, comment: &NewComment) -> Result<(), BackendError>;

    /// Scores ordered by score descending, optionally filtered, limited.
    async fn list_high_scores(&self, query: &ScoreQuery) -> Result<Vec<HighScore>, BackendError>;

    async fn insert_high_score(&self, access_token: &str, score: &NewHighScore) -> Result<(), BackendError>;

    /// Open a realtime channel delivering comment inserts for one game.
    async fn subscribe_comments(&self, game_id: &str) -> Result<Subscription, BackendError>;
}
