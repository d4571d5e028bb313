//! In-process backend — tables, auth, and realtime fan-out held in memory.
//!
//! DESIGN
//! ======
//! Stands in for the hosted service when no backend URL is configured and
//! serves as the test double. It enforces the same rules the hosted service
//! does for this portal: inserts require a valid token whose user matches the
//! row's `user_id`, reads join the submitter's username, and comment inserts
//! are fanned out to realtime subscribers of that game.
//!
//! Nothing survives a restart.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Mutex;

use rand::Rng;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::{
    AuthSession, Backend, BackendError, ChangeNotice, Comment, HighScore, NewComment, NewHighScore, Profile,
    ProfileName, RowId, ScoreQuery, SignUpOutcome, Subscription, User,
};

const FANOUT_CAPACITY: usize = 64;
const NOTICE_BUFFER: usize = 16;
const SESSION_TTL_SECS: u64 = 3600;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

struct Account {
    user: User,
    password: String,
    username: String,
    confirmed: bool,
}

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    /// access token -> user id
    sessions: HashMap<String, Uuid>,
    /// refresh token -> user id; each is spent by one refresh
    refresh_tokens: HashMap<String, Uuid>,
    comments: Vec<Comment>,
    scores: Vec<HighScore>,
    next_row_id: i64,
    write_attempts: usize,
    read_failure: Option<String>,
    write_failure: Option<String>,
}

impl Tables {
    fn profile_name(&self, user_id: Uuid) -> Option<ProfileName> {
        self.accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| ProfileName { username: Some(a.username.clone()) })
    }

    fn check_read(&self) -> Result<(), BackendError> {
        match &self.read_failure {
            Some(message) => Err(BackendError::Api { status: 500, message: message.clone() }),
            None => Ok(()),
        }
    }

    /// Count the attempt, then apply injected failure and token/owner checks.
    fn check_write(&mut self, access_token: &str, user_id: Uuid, table: &str) -> Result<(), BackendError> {
        self.write_attempts += 1;
        if let Some(message) = &self.write_failure {
            return Err(BackendError::Api { status: 500, message: message.clone() });
        }
        let Some(owner) = self.sessions.get(access_token) else {
            return Err(BackendError::Unauthorized);
        };
        if *owner != user_id {
            return Err(BackendError::Api {
                status: 403,
                message: format!("new row violates row-level security policy for table \"{table}\""),
            });
        }
        Ok(())
    }

    fn next_id(&mut self) -> RowId {
        self.next_row_id += 1;
        RowId::Int(self.next_row_id)
    }

    fn open_session(&mut self, user: &User) -> AuthSession {
        let access_token = generate_token();
        let refresh_token = generate_token();
        self.sessions.insert(access_token.clone(), user.id);
        self.refresh_tokens.insert(refresh_token.clone(), user.id);
        AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: Some(SESSION_TTL_SECS),
            user: user.clone(),
        }
    }
}

pub struct MemoryBackend {
    tables: Mutex<Tables>,
    inserts: broadcast::Sender<Comment>,
    require_confirmation: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Accounts are confirmed on sign-up and get a session immediately.
    #[must_use]
    pub fn new() -> Self {
        let (inserts, _) = broadcast::channel(FANOUT_CAPACITY);
        Self { tables: Mutex::new(Tables::default()), inserts, require_confirmation: false }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// TEST CONTROLS
// =============================================================================

#[cfg(test)]
impl MemoryBackend {
    /// Sign-up leaves accounts unconfirmed, like an email-confirmation flow.
    #[must_use]
    pub fn requiring_confirmation() -> Self {
        Self { require_confirmation: true, ..Self::new() }
    }

    /// Create a confirmed account and return a live session for it.
    pub fn seed_user(&self, email: &str, password: &str, username: &str) -> AuthSession {
        let mut tables = self.lock();
        let user = new_user(email, username);
        tables.accounts.push(Account {
            user: user.clone(),
            password: password.to_owned(),
            username: username.to_owned(),
            confirmed: true,
        });
        tables.open_session(&user)
    }

    /// Forget an access token as if it had expired. Its refresh token stays valid.
    pub fn expire_access_token(&self, access_token: &str) {
        self.lock().sessions.remove(access_token);
    }

    /// Number of insert calls received, successful or not.
    pub fn write_attempts(&self) -> usize {
        self.lock().write_attempts
    }

    /// Make every read fail with `message` (or stop failing with `None`).
    pub fn fail_reads(&self, message: Option<&str>) {
        self.lock().read_failure = message.map(str::to_owned);
    }

    /// Make every insert fail with `message` (or stop failing with `None`).
    pub fn fail_writes(&self, message: Option<&str>) {
        self.lock().write_failure = message.map(str::to_owned);
    }

    pub fn high_scores(&self) -> Vec<HighScore> {
        self.lock().scores.clone()
    }

    /// Realtime subscriptions whose forwarder is still running.
    pub fn live_subscriptions(&self) -> usize {
        self.inserts.receiver_count()
    }
}

fn new_user(email: &str, username: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: Some(email.to_owned()),
        user_metadata: serde_json::json!({ "username": username }),
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let mut tables = self.lock();
        let Some(account) = tables
            .accounts
            .iter()
            .find(|a| a.user.email.as_deref() == Some(email) && a.password == password)
        else {
            return Err(BackendError::Api { status: 400, message: "Invalid login credentials".into() });
        };
        if !account.confirmed {
            return Err(BackendError::Api { status: 400, message: "Email not confirmed".into() });
        }
        let user = account.user.clone();
        Ok(tables.open_session(&user))
    }

    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<SignUpOutcome, BackendError> {
        let mut tables = self.lock();
        if tables
            .accounts
            .iter()
            .any(|a| a.user.email.as_deref() == Some(email))
        {
            return Ok(SignUpOutcome::AlreadyRegistered);
        }
        let user = new_user(email, username);
        tables.accounts.push(Account {
            user: user.clone(),
            password: password.to_owned(),
            username: username.to_owned(),
            confirmed: !self.require_confirmation,
        });
        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        Ok(SignUpOutcome::SignedIn(tables.open_session(&user)))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut tables = self.lock();
        let user_id = tables
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(BackendError::Unauthorized)?;
        let user = tables
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or(BackendError::Unauthorized)?;
        Ok(tables.open_session(&user))
    }

    async fn get_user(&self, access_token: &str) -> Result<User, BackendError> {
        let tables = self.lock();
        let user_id = tables
            .sessions
            .get(access_token)
            .ok_or(BackendError::Unauthorized)?;
        tables
            .accounts
            .iter()
            .find(|a| a.user.id == *user_id)
            .map(|a| a.user.clone())
            .ok_or(BackendError::Unauthorized)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let mut tables = self.lock();
        if let Some(user_id) = tables.sessions.remove(access_token) {
            tables.refresh_tokens.retain(|_, owner| *owner != user_id);
        }
        Ok(())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let tables = self.lock();
        tables.check_read()?;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| Profile { id: a.user.id, username: a.username.clone() }))
    }

    async fn list_comments(&self, game_id: &str) -> Result<Vec<Comment>, BackendError> {
        let tables = self.lock();
        tables.check_read()?;
        let mut rows: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.game_id == game_id)
            .map(|c| Comment { profiles: tables.profile_name(c.user_id), ..c.clone() })
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn insert_comment(&self, access_token: &str, comment: &NewComment) -> Result<(), BackendError> {
        let row = {
            let mut tables = self.lock();
            tables.check_write(access_token, comment.user_id, "comments")?;
            let row = Comment {
                id: tables.next_id(),
                game_id: comment.game_id.clone(),
                user_id: comment.user_id,
                content: comment.content.clone(),
                created_at: OffsetDateTime::now_utc(),
                profiles: None,
            };
            tables.comments.push(row.clone());
            row
        };
        // No subscribers is fine.
        let _ = self.inserts.send(row);
        Ok(())
    }

    async fn list_high_scores(&self, query: &ScoreQuery) -> Result<Vec<HighScore>, BackendError> {
        let tables = self.lock();
        tables.check_read()?;
        let mut rows: Vec<HighScore> = tables
            .scores
            .iter()
            .filter(|s| query.game_id.as_deref().is_none_or(|g| s.game_id == g))
            .map(|s| HighScore { profiles: tables.profile_name(s.user_id), ..s.clone() })
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn insert_high_score(&self, access_token: &str, score: &NewHighScore) -> Result<(), BackendError> {
        let mut tables = self.lock();
        tables.check_write(access_token, score.user_id, "high_scores")?;
        let row = HighScore {
            id: tables.next_id(),
            game_id: score.game_id.clone(),
            user_id: score.user_id,
            score: score.score,
            created_at: OffsetDateTime::now_utc(),
            profiles: None,
        };
        tables.scores.push(row);
        Ok(())
    }

    async fn subscribe_comments(&self, game_id: &str) -> Result<Subscription, BackendError> {
        let mut inserts = self.inserts.subscribe();
        let (tx, subscription) = Subscription::channel(NOTICE_BUFFER);
        let game_id = game_id.to_owned();

        tokio::spawn(async move {
            loop {
                let notice = tokio::select! {
                    () = tx.closed() => return,
                    received = inserts.recv() => match received {
                        Ok(row) if row.game_id == game_id => ChangeNotice {
                            table: "comments".into(),
                            record: serde_json::to_value(&row).unwrap_or_default(),
                        },
                        Ok(_) => continue,
                        // Missed rows still mean "something changed".
                        Err(RecvError::Lagged(_)) => ChangeNotice {
                            table: "comments".into(),
                            record: serde_json::Value::Null,
                        },
                        Err(RecvError::Closed) => return,
                    },
                };
                if tx.send(notice).await.is_err() {
                    return;
                }
            }
        });

        Ok(subscription)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
