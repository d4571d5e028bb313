//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the one backend client built at startup and the bundled game
//! catalog. Neither is mutated after startup; per-visitor state lives in
//! cookies and per-socket state in the socket task.

use std::sync::Arc;

use crate::backend::Backend;
use crate::catalog::Catalog;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub catalog: Arc<Catalog>,
    /// `Secure` flag for session cookies.
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, catalog: Catalog, cookie_secure: bool) -> Self {
        Self { backend, catalog: Arc::new(catalog), cookie_secure }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
