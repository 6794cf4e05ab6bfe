use std::sync::Arc;

use crate::auth::tokens::TokenService;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Holds no per-request mutable data: the store is the only thing requests share.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable persistence. Default: `PgStore`; tests use `MemoryStore`.
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
}
