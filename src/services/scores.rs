//! High score board — ranked top scores and score submission.

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError, HighScore, NewHighScore, ScoreQuery};
use crate::catalog::Catalog;
use crate::services::session::SessionState;

/// Rows shown on the leaderboard.
pub const LEADERBOARD_LIMIT: usize = 100;

pub const SCORE_SUBMITTED: &str = "Score submitted! View it on the High Scores page.";

// =============================================================================
// FILTER
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LeaderboardFilter {
    #[default]
    All,
    Game(String),
}

impl LeaderboardFilter {
    /// Parse the `?game=` value; absent, blank and `all` mean every game.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(id) => Self::Game(id.to_owned()),
        }
    }

    #[must_use]
    pub fn game_id(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Game(id) => Some(id),
        }
    }

    /// Value for the `?game=` query parameter.
    #[must_use]
    pub fn param(&self) -> &str {
        self.game_id().unwrap_or("all")
    }

    #[must_use]
    pub fn matches(&self, game_id: &str) -> bool {
        self.game_id().is_none_or(|id| id == game_id)
    }

    fn query(&self) -> ScoreQuery {
        ScoreQuery { game_id: self.game_id().map(str::to_owned), limit: LEADERBOARD_LIMIT }
    }
}

// =============================================================================
// RANKING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    #[must_use]
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    /// CSS modifier for the trophy icon.
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Gold => "medal-gold",
            Self::Silver => "medal-silver",
            Self::Bronze => "medal-bronze",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedScore {
    /// 1-based position in the backend's order.
    pub rank: usize,
    pub username: String,
    pub game_id: String,
    pub game_name: String,
    pub score: i64,
    pub created_at: OffsetDateTime,
}

impl RankedScore {
    #[must_use]
    pub fn medal(&self) -> Option<Medal> {
        Medal::for_rank(self.rank)
    }

    #[must_use]
    pub fn formatted_score(&self) -> String {
        format_score(self.score)
    }
}

/// Number rows in the order given, enriching each with its game's name.
///
/// Rows outside the filter are dropped and the result is capped at
/// [`LEADERBOARD_LIMIT`]; no re-sorting happens here.
#[must_use]
pub fn rank_scores(rows: Vec<HighScore>, catalog: &Catalog, filter: &LeaderboardFilter) -> Vec<RankedScore> {
    rows.into_iter()
        .filter(|row| filter.matches(&row.game_id))
        .take(LEADERBOARD_LIMIT)
        .enumerate()
        .map(|(i, row)| RankedScore {
            rank: i + 1,
            username: row.username().to_owned(),
            game_name: catalog.display_name(&row.game_id).to_owned(),
            game_id: row.game_id,
            score: row.score,
            created_at: row.created_at,
        })
        .collect()
}

/// Top scores for `filter`, ranked.
pub async fn load_leaderboard(
    backend: &dyn Backend,
    catalog: &Catalog,
    filter: &LeaderboardFilter,
) -> Result<Vec<RankedScore>, BackendError> {
    let rows = backend
        .list_high_scores(&filter.query())
        .await
        .inspect_err(|e| warn!(game = filter.param(), error = %e, "scores: leaderboard load failed"))?;
    Ok(rank_scores(rows, catalog, filter))
}

/// `15000` → `15,000`.
#[must_use]
pub fn format_score(score: i64) -> String {
    let digits = score.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if score < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// SUBMISSION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("Please enter a score.")]
    Missing,
    #[error("Please enter a valid positive number for your score.")]
    NotNumeric,
    #[error("Please enter a valid positive number for your score.")]
    NotPositive,
    #[error("Log in or sign up to submit your score!")]
    NotSignedIn,
    #[error("{0}")]
    Backend(String),
}

impl From<BackendError> for ScoreError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err.user_message())
    }
}

impl crate::frame::ErrorCode for ScoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing => "E_SCORE_MISSING",
            Self::NotNumeric => "E_SCORE_NOT_NUMERIC",
            Self::NotPositive => "E_SCORE_NOT_POSITIVE",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::Backend(_) => "E_SCORE_BACKEND",
        }
    }
}

/// Validate raw form input as a positive integer score.
///
/// # Errors
///
/// Empty, non-numeric, zero and negative input.
pub fn parse_score(raw: &str) -> Result<i64, ScoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScoreError::Missing);
    }
    let score: i64 = trimmed
        .parse()
        .map_err(|_| ScoreError::NotNumeric)?;
    if score <= 0 {
        return Err(ScoreError::NotPositive);
    }
    Ok(score)
}

/// Validate and insert a score for the signed-in visitor.
///
/// # Errors
///
/// Validation errors are returned before any backend call.
pub async fn submit_score(
    backend: &dyn Backend,
    session: &SessionState,
    game_id: &str,
    raw: &str,
) -> Result<NewHighScore, ScoreError> {
    let score = parse_score(raw)?;
    let (token, user_id) = session
        .credentials()
        .ok_or(ScoreError::NotSignedIn)?;
    let row = NewHighScore { game_id: game_id.to_owned(), user_id, score };
    backend
        .insert_high_score(token, &row)
        .await
        .map_err(|e| {
            warn!(%game_id, %user_id, error = %e, "scores: insert failed");
            ScoreError::from(e)
        })?;
    info!(%game_id, score, "scores: submitted");
    Ok(row)
}

#[cfg(test)]
#[path = "scores_test.rs"]
mod tests;
