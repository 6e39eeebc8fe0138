//! Direct relational store provider.

use std::time::Duration;

use async_trait::async_trait;

use super::{Backend, CallContext, DEFAULT_PROBE_TIMEOUT, EventProvider};
use crate::domain::{Event, EventId, EventPatch, GeneratedContent, NewEvent, NewGeneratedContent};
use crate::error::PlannerError;
use crate::persistence::PostgresStore;

/// Event CRUD straight against PostgreSQL.
///
/// Reads without an identity see nothing, the same answer row-level
/// security gives an anonymous session. Writes require an identity.
#[derive(Debug, Clone)]
pub struct DatabaseProvider {
    store: PostgresStore,
    probe_timeout: Duration,
}

impl DatabaseProvider {
    /// Wraps a store.
    #[must_use]
    pub fn new(store: PostgresStore) -> Self {
        Self {
            store,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the liveness probe timeout.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Single `SELECT 1` bounded by the probe timeout. No retries.
    pub async fn probe(&self) -> bool {
        self.store.ping(self.probe_timeout).await
    }

    /// Stores generated content owned by the context identity.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Unauthenticated`] without an identity, or a
    /// [`PlannerError::Persistence`] on database failure.
    pub async fn save_content(
        &self,
        ctx: &CallContext,
        new: &NewGeneratedContent,
    ) -> Result<GeneratedContent, PlannerError> {
        let owner = ctx.require_identity()?;
        self.store.insert_content(owner, new).await
    }

    /// Lists content generated for an event.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure.
    pub async fn list_content(
        &self,
        ctx: &CallContext,
        event_id: EventId,
    ) -> Result<Vec<GeneratedContent>, PlannerError> {
        let Some(owner) = &ctx.identity else {
            return Ok(Vec::new());
        };
        self.store.list_content(owner, event_id).await
    }
}

#[async_trait]
impl EventProvider for DatabaseProvider {
    fn backend(&self) -> Backend {
        Backend::Database
    }

    async fn list(&self, ctx: &CallContext) -> Result<Vec<Event>, PlannerError> {
        let Some(owner) = &ctx.identity else {
            return Ok(Vec::new());
        };
        self.store.list_events(owner).await
    }

    async fn get(&self, ctx: &CallContext, id: EventId) -> Result<Option<Event>, PlannerError> {
        let Some(owner) = &ctx.identity else {
            return Ok(None);
        };
        self.store.get_event(owner, id).await
    }

    async fn create(&self, ctx: &CallContext, new: &NewEvent) -> Result<Event, PlannerError> {
        let owner = ctx.require_identity()?;
        new.validate()?;
        self.store.insert_event(owner, new).await
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError> {
        let owner = ctx.require_identity()?;
        patch.validate()?;
        self.store.update_event(owner, id, patch).await
    }

    async fn delete(&self, ctx: &CallContext, id: EventId) -> Result<bool, PlannerError> {
        let owner = ctx.require_identity()?;
        self.store.delete_event(owner, id).await
    }
}
