//! Game catalog — the static, bundled list of playable games.
//!
//! DESIGN
//! ======
//! The catalog ships inside the binary as YAML and is parsed once at startup.
//! It is immutable afterwards and shared through `AppState`. Every other
//! component resolves games by identifier (detail view, leaderboard game
//! names) or by category (home page sections).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

const BUNDLED_CATALOG: &str = include_str!("catalog.yaml");

/// Embed height used when a game does not declare one.
pub const DEFAULT_EMBED_HEIGHT: u32 = 600;

/// Name shown for score rows whose game is not in the catalog.
pub const UNKNOWN_GAME_NAME: &str = "Unknown Game";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Arcade,
    Puzzle,
    Action,
    Strategy,
    Sports,
}

impl Category {
    pub const ALL: [Category; 5] = [Self::Arcade, Self::Puzzle, Self::Action, Self::Strategy, Self::Sports];

    /// Heading label for the category section.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Arcade => "Arcade",
            Self::Puzzle => "Puzzle",
            Self::Action => "Action",
            Self::Strategy => "Strategy",
            Self::Sports => "Sports",
        }
    }

    /// URL slug, as used by the `?category=` filter.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Arcade => "arcade",
            Self::Puzzle => "puzzle",
            Self::Action => "action",
            Self::Strategy => "strategy",
            Self::Sports => "sports",
        }
    }

    /// Parse a slug case-insensitively.
    #[must_use]
    pub fn from_slug(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a game is put on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
    /// Directly embeddable document, rendered in a sandboxed frame.
    Html5,
    /// Legacy plugin binary, loaded into the browser-side emulator.
    Flash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub kind: EmbedKind,
    pub path: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub instructions: String,
    pub description: String,
}

impl Game {
    /// Embed width as an HTML dimension (pixels, or `100%` when unset).
    #[must_use]
    pub fn embed_width(&self) -> String {
        self.width
            .map_or_else(|| "100%".to_owned(), |w| w.to_string())
    }

    #[must_use]
    pub fn embed_height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_EMBED_HEIGHT)
    }

    #[must_use]
    pub fn detail_href(&self) -> String {
        format!("/game/{}", self.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("catalog entry {index} has an empty id")]
    EmptyId { index: usize },
    #[error("duplicate game id in catalog: {0}")]
    DuplicateId(String),
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone)]
pub struct Catalog {
    games: Vec<Game>,
}

impl Catalog {
    /// Parse the catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled YAML is malformed or has bad ids.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    /// Parse a YAML list of games.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML, an empty id, or a duplicate id.
    pub fn from_yaml(raw: &str) -> Result<Self, CatalogError> {
        let games: Vec<Game> = serde_yaml::from_str(raw)?;
        Self::new(games)
    }

    /// Build a catalog from already-parsed games.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty or duplicate id.
    pub fn new(games: Vec<Game>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, game) in games.iter().enumerate() {
            if game.id.trim().is_empty() {
                return Err(CatalogError::EmptyId { index });
            }
            if !seen.insert(game.id.as_str()) {
                return Err(CatalogError::DuplicateId(game.id.clone()));
            }
        }
        Ok(Self { games })
    }

    #[must_use]
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Games grouped by category, sections ordered by first appearance.
    #[must_use]
    pub fn grouped(&self) -> Vec<(Category, Vec<&Game>)> {
        let mut sections: Vec<(Category, Vec<&Game>)> = Vec::new();
        for game in &self.games {
            match sections.iter_mut().find(|(c, _)| *c == game.category) {
                Some((_, games)) => games.push(game),
                None => sections.push((game.category, vec![game])),
            }
        }
        sections
    }

    /// Display name for a game id, falling back to [`UNKNOWN_GAME_NAME`].
    #[must_use]
    pub fn display_name(&self, id: &str) -> &str {
        self.get(id)
            .map_or(UNKNOWN_GAME_NAME, |g| g.name.as_str())
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
