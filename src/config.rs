//! Process configuration parsed from environment variables.
//!
//! A `.env` file is loaded by `main` before this runs, so everything here
//! reads plain `std::env`.

use std::path::PathBuf;

use crate::backend::config::BackendConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_GAMES_DIR: &str = "public/games";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: String },
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// `None` runs against the in-process backend.
    pub backend: Option<BackendConfig>,
    pub cookie_secure: bool,
    pub static_dir: PathBuf,
    pub games_dir: PathBuf,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `ARCADE_BACKEND_URL` / `ARCADE_BACKEND_ANON_KEY`: see [`BackendConfig`]
    /// - `COOKIE_SECURE`: default inferred from the backend URL scheme
    /// - `ARCADE_STATIC_DIR`: default `static`
    /// - `ARCADE_GAMES_DIR`: default `public/games`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a number or backend settings are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT".into(), value: raw })?,
            Err(_) => DEFAULT_PORT,
        };
        let backend = BackendConfig::from_env()?;
        let cookie_secure = env_bool("COOKIE_SECURE")
            .unwrap_or_else(|| backend.as_ref().is_some_and(BackendConfig::is_https));
        let static_dir = env_path("ARCADE_STATIC_DIR", DEFAULT_STATIC_DIR);
        let games_dir = env_path("ARCADE_GAMES_DIR", DEFAULT_GAMES_DIR);

        Ok(Self { port, backend, cookie_secure, static_dir, games_dir })
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(default), PathBuf::from)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
