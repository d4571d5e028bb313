//! Domain services used by page and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the portal's behavior (session resolution, comment
//! feed sync, leaderboard ranking, form validation) so route handlers can
//! stay focused on HTTP translation and view composition.

pub mod auth;
pub mod comments;
pub mod scores;
pub mod session;
