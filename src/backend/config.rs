//! Backend connection settings parsed from environment variables.

use crate::config::{ConfigError, env_parse_u64};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without trailing slash, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public API key sent with every request.
    pub anon_key: String,
    pub timeouts: BackendTimeouts,
}

impl BackendConfig {
    /// Build backend config from environment variables.
    ///
    /// Returns `Ok(None)` when `ARCADE_BACKEND_URL` is unset.
    ///
    /// Required when the URL is set:
    /// - `ARCADE_BACKEND_ANON_KEY`
    ///
    /// Optional:
    /// - `ARCADE_BACKEND_TIMEOUT_SECS`: default 15
    /// - `ARCADE_BACKEND_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the key is missing.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(url) = std::env::var("ARCADE_BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        else {
            return Ok(None);
        };
        let anon_key = std::env::var("ARCADE_BACKEND_ANON_KEY")
            .map_err(|_| ConfigError::Missing { var: "ARCADE_BACKEND_ANON_KEY".into() })?;
        let timeouts = BackendTimeouts {
            request_secs: env_parse_u64("ARCADE_BACKEND_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ARCADE_BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(&url, anon_key, timeouts).map(Some)
    }

    /// # Errors
    ///
    /// Returns an error if `url` is not http(s) or `anon_key` is blank.
    pub fn new(url: &str, anon_key: String, timeouts: BackendTimeouts) -> Result<Self, ConfigError> {
        let url = url.trim().trim_end_matches('/').to_owned();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid { var: "ARCADE_BACKEND_URL".into(), value: url });
        }
        if anon_key.trim().is_empty() {
            return Err(ConfigError::Missing { var: "ARCADE_BACKEND_ANON_KEY".into() });
        }
        Ok(Self { url, anon_key, timeouts })
    }

    #[must_use]
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    #[must_use]
    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.url)
    }

    /// Realtime socket URL: same host, ws(s) scheme.
    #[must_use]
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        };
        format!("{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", self.anon_key)
    }

    /// Whether the backend is reached over TLS.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.url.starts_with("https://")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
