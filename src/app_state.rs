//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::domain::UserId;
use crate::provider::rest::USER_ID_HEADER;
use crate::provider::{CallContext, EventProvider};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Provider serving the REST contract. The database in production.
    pub events: Arc<dyn EventProvider>,
}

impl AppState {
    /// Creates state around an event provider.
    #[must_use]
    pub fn new(events: Arc<dyn EventProvider>) -> Self {
        Self { events }
    }

    /// Call context for a request, with the caller taken from the
    /// identity header.
    #[must_use]
    pub fn context(&self, headers: &HeaderMap) -> CallContext {
        let identity = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(UserId::from);
        CallContext::new(self.events.backend(), identity)
    }
}
