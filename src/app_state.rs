//! Shared application state injected into all Axum handlers.

use crate::persistence::Store;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage handle; cloning shares the underlying pool.
    pub store: Store,
}

impl AppState {
    /// Wraps a connected store.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}
