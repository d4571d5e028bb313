//! Comment feed sync — load, submit, and live re-fetch of a game's comments.
//!
//! DESIGN
//! ======
//! A [`CommentFeed`] owns one background task per displayed game. The task
//! loads the list, opens a realtime channel for that game, and re-runs the
//! full load whenever a notification (or an explicit refresh) arrives. It
//! never merges the notification payload; the backend's list is the only
//! source of truth.
//!
//! Snapshots are published on a `watch` channel. When every receiver is
//! gone the task stops, dropping its realtime subscription with it.
//!
//! LIFECYCLE
//! =========
//! `retarget` aborts and awaits the old task before spawning the new one, so
//! at most one channel is live per feed. Dropping the feed aborts its task.

use std::sync::Arc;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, Comment, NewComment, Subscription};
use crate::services::session::SessionState;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    #[error("Comment cannot be empty.")]
    Empty,
    #[error("Log in to join the conversation!")]
    NotSignedIn,
    #[error("Your comment is already being posted.")]
    InFlight,
    #[error("Failed to post comment: {0}")]
    Backend(String),
}

impl From<BackendError> for CommentError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err.user_message())
    }
}

impl crate::frame::ErrorCode for CommentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_COMMENT_EMPTY",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::InFlight => "E_COMMENT_IN_FLIGHT",
            Self::Backend(_) => "E_COMMENT_BACKEND",
        }
    }
}

// =============================================================================
// LOAD
// =============================================================================

/// All comments for `game_id`, newest first, usernames joined.
pub async fn load_comments(backend: &dyn Backend, game_id: &str) -> Result<Vec<Comment>, BackendError> {
    backend
        .list_comments(game_id)
        .await
        .inspect_err(|e| warn!(%game_id, error = %e, "comments: load failed"))
}

/// Text shown in place of the list when a load fails.
#[must_use]
pub fn load_error_message(err: &BackendError) -> String {
    format!("Could not load comments: {}", err.user_message())
}

// =============================================================================
// COMPOSER
// =============================================================================

/// The comment box: typed text, in-flight flag, last error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentComposer {
    pub draft: String,
    pub submitting: bool,
    pub error: Option<String>,
}

impl CommentComposer {
    #[must_use]
    pub fn with_draft(draft: impl Into<String>) -> Self {
        Self { draft: draft.into(), ..Self::default() }
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.draft.trim().is_empty()
    }

    /// Start a submit, returning the content to insert.
    ///
    /// # Errors
    ///
    /// Whitespace-only drafts and a submit already in flight are refused here,
    /// before anything reaches the backend.
    pub fn begin_submit(&mut self) -> Result<String, CommentError> {
        if self.submitting {
            return Err(CommentError::InFlight);
        }
        if self.draft.trim().is_empty() {
            self.error = Some(CommentError::Empty.to_string());
            return Err(CommentError::Empty);
        }
        self.submitting = true;
        self.error = None;
        Ok(self.draft.clone())
    }

    /// Settle a submit: clear on success, keep the draft and show why on failure.
    pub fn finish(&mut self, result: &Result<(), CommentError>) {
        self.submitting = false;
        match result {
            Ok(()) => {
                self.draft.clear();
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }
}

/// Post the composer's draft as the signed-in visitor.
///
/// # Errors
///
/// Returns the validation or backend error; the composer reflects it.
pub async fn submit_comment(
    backend: &dyn Backend,
    session: &SessionState,
    game_id: &str,
    composer: &mut CommentComposer,
) -> Result<(), CommentError> {
    let content = composer.begin_submit()?;
    let result = match session.credentials() {
        None => Err(CommentError::NotSignedIn),
        Some((token, user_id)) => {
            let row = NewComment { content, game_id: game_id.to_owned(), user_id };
            backend
                .insert_comment(token, &row)
                .await
                .map_err(|e| {
                    warn!(%game_id, %user_id, error = %e, "comments: insert failed");
                    CommentError::from(e)
                })
        }
    };
    composer.finish(&result);
    if result.is_ok() {
        info!(%game_id, "comments: posted");
    }
    result
}

// =============================================================================
// LIVE FEED
// =============================================================================

/// What observers of a feed see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub comments: Vec<Comment>,
    pub error: Option<String>,
    /// A realtime channel is open for this game.
    pub live: bool,
    /// Bumped on every publish; 0 means nothing loaded yet.
    pub revision: u64,
}

pub struct CommentFeed {
    backend: Arc<dyn Backend>,
    game_id: String,
    snapshots: watch::Receiver<FeedSnapshot>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl CommentFeed {
    /// Spawn the fetch → subscribe → re-fetch loop for `game_id`.
    pub fn open(backend: Arc<dyn Backend>, game_id: &str) -> Self {
        let (tx, snapshots) = watch::channel(FeedSnapshot::default());
        let refresh = Arc::new(Notify::new());
        let task = tokio::spawn(run_feed(backend.clone(), game_id.to_owned(), tx, refresh.clone()));
        Self { backend, game_id: game_id.to_owned(), snapshots, refresh, task }
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// A fresh receiver; it starts at the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }

    /// Ask the task to re-run the load now.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Switch to another game, closing the current channel first.
    pub async fn retarget(&mut self, game_id: &str) {
        if self.game_id == game_id {
            return;
        }
        self.task.abort();
        let _ = (&mut self.task).await;
        debug!(from = %self.game_id, to = %game_id, "comments: feed retargeted");

        let (tx, snapshots) = watch::channel(FeedSnapshot::default());
        let refresh = Arc::new(Notify::new());
        self.task = tokio::spawn(run_feed(self.backend.clone(), game_id.to_owned(), tx, refresh.clone()));
        self.game_id = game_id.to_owned();
        self.snapshots = snapshots;
        self.refresh = refresh;
    }
}

impl Drop for CommentFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Wake {
    Observers,
    Refresh,
    Change,
    ChannelEnded,
}

async fn next_change(subscription: &mut Option<Subscription>) -> Option<()> {
    match subscription {
        Some(sub) => sub.next().await.map(|_| ()),
        None => std::future::pending().await,
    }
}

async fn run_feed(backend: Arc<dyn Backend>, game_id: String, tx: watch::Sender<FeedSnapshot>, refresh: Arc<Notify>) {
    publish_load(&tx, backend.as_ref(), &game_id).await;

    let mut subscription = match backend.subscribe_comments(&game_id).await {
        Ok(sub) => Some(sub),
        Err(e) => {
            warn!(%game_id, error = %e, "comments: realtime subscribe failed; list will not auto-update");
            None
        }
    };
    let live = subscription.is_some();
    tx.send_modify(|snap| {
        snap.live = live;
        snap.revision += 1;
    });

    loop {
        let wake = tokio::select! {
            () = tx.closed() => Wake::Observers,
            () = refresh.notified() => Wake::Refresh,
            change = next_change(&mut subscription) => match change {
                Some(()) => Wake::Change,
                None => Wake::ChannelEnded,
            },
        };

        match wake {
            Wake::Observers => {
                debug!(%game_id, "comments: no observers left; feed stopping");
                return;
            }
            Wake::ChannelEnded => {
                warn!(%game_id, "comments: realtime channel ended");
                subscription = None;
                tx.send_modify(|snap| {
                    snap.live = false;
                    snap.revision += 1;
                });
            }
            Wake::Refresh | Wake::Change => {
                debug!(%game_id, "comments: re-fetching");
                publish_load(&tx, backend.as_ref(), &game_id).await;
            }
        }
    }
}

async fn publish_load(tx: &watch::Sender<FeedSnapshot>, backend: &dyn Backend, game_id: &str) {
    let result = load_comments(backend, game_id).await;
    tx.send_modify(|snap| {
        match result {
            Ok(comments) => {
                snap.comments = comments;
                snap.error = None;
            }
            Err(e) => {
                snap.comments.clear();
                snap.error = Some(load_error_message(&e));
            }
        }
        snap.revision += 1;
    });
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
