//! Event service: provider selection, failure policy and mirror sync.

use std::future::Future;

use sqlx::postgres::PgPoolOptions;

use super::policy::{FailurePolicy, OperationKind};
use crate::config::ClientConfig;
use crate::domain::{Event, EventId, EventPatch, GeneratedContent, NewEvent, NewGeneratedContent};
use crate::error::PlannerError;
use crate::identity::IdentityResolver;
use crate::persistence::PostgresStore;
use crate::provider::{
    Backend, CallContext, DatabaseProvider, EventMirror, EventProvider, RestProvider,
};
use crate::storage::DeviceStorage;

/// Client-side entry point for event CRUD.
///
/// Every call follows the same pattern: build a [`CallContext`] (probe
/// the REST backend, resolve the identity) → dispatch to one provider →
/// apply the operation's [`FailurePolicy`] → mirror the result on device.
///
/// Provider preference is REST (when live), then the database (when
/// configured), then the mirror alone. Offline updates stay in the
/// mirror; nothing replays them to a remote store later.
#[derive(Debug, Clone)]
pub struct EventService {
    rest: Option<RestProvider>,
    database: Option<DatabaseProvider>,
    mirror: EventMirror,
    identity: IdentityResolver,
}

impl EventService {
    /// Creates a local-only service. The mirror lives in the persistent
    /// scope of `storage`; the identity is read from both scopes.
    #[must_use]
    pub fn new(storage: DeviceStorage) -> Self {
        let mirror = EventMirror::new(std::sync::Arc::clone(storage.persistent()));
        Self {
            rest: None,
            database: None,
            mirror,
            identity: IdentityResolver::new(storage),
        }
    }

    /// Adds a REST backend, preferred whenever its probe succeeds.
    #[must_use]
    pub fn with_rest(mut self, rest: RestProvider) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Adds a direct database client, used when REST is not live and the
    /// database answers its own probe.
    #[must_use]
    pub fn with_database(mut self, database: DatabaseProvider) -> Self {
        self.database = Some(database);
        self
    }

    /// Builds a service from client configuration. The database pool is
    /// created lazily and does not connect here.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Persistence`] if `DATABASE_URL` is set but
    /// not a valid connection string.
    pub fn from_config(config: &ClientConfig) -> Result<Self, PlannerError> {
        let mut service = Self::new(DeviceStorage::with_persistent_dir(&config.storage_dir));
        if let Some(base_url) = &config.api_base_url {
            service = service
                .with_rest(RestProvider::new(base_url).with_probe_timeout(config.probe_timeout));
        }
        if let Some(database_url) = &config.database_url {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(config.database_connect_timeout)
                .connect_lazy(database_url)?;
            service = service.with_database(
                DatabaseProvider::new(PostgresStore::new(pool))
                    .with_probe_timeout(config.probe_timeout),
            );
        }
        Ok(service)
    }

    /// The on-device mirror.
    #[must_use]
    pub fn mirror(&self) -> &EventMirror {
        &self.mirror
    }

    /// The identity resolver.
    #[must_use]
    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Probes the REST backend, then the database, and resolves the
    /// identity for one call.
    pub async fn context(&self) -> CallContext {
        let backend = match (&self.rest, &self.database) {
            (Some(rest), _) if rest.probe().await => Backend::Rest,
            (_, Some(database)) if database.probe().await => Backend::Database,
            _ => Backend::Local,
        };
        let identity = self.identity.resolve().await;
        tracing::debug!(%backend, signed_in = identity.is_some(), "call context");
        CallContext::new(backend, identity)
    }

    fn provider(&self, backend: Backend) -> &dyn EventProvider {
        match (backend, &self.rest, &self.database) {
            (Backend::Rest, Some(rest), _) => rest as &dyn EventProvider,
            (Backend::Database, _, Some(database)) => database,
            _ => &self.mirror,
        }
    }

    /// Applies the failure policy of `op` to a provider result. On the
    /// local path the mirror already served the call, so its result
    /// stands as is.
    async fn settle<T, F>(
        &self,
        op: OperationKind,
        ctx: &CallContext,
        result: Result<T, PlannerError>,
        on_mirror: F,
    ) -> Result<T, PlannerError>
    where
        F: Future<Output = Result<T, PlannerError>>,
    {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        match op.failure_policy() {
            FailurePolicy::DegradeToMirror if ctx.backend.is_remote() => {
                tracing::warn!(operation = %op, backend = %ctx.backend, error = %err, "remote read failed, serving from mirror");
                on_mirror.await
            }
            _ => {
                tracing::error!(operation = %op, backend = %ctx.backend, error = %err, "event operation failed");
                Err(err)
            }
        }
    }

    /// Lists events. Never fails: a failed remote read falls back to the
    /// mirror, and an unreadable mirror reads as empty.
    pub async fn list_events(&self) -> Vec<Event> {
        let ctx = self.context().await;
        let result = self.provider(ctx.backend).list(&ctx).await;
        let from_remote = ctx.backend.is_remote() && result.is_ok();
        let events = self
            .settle(OperationKind::List, &ctx, result, self.mirror.list(&ctx))
            .await
            .unwrap_or_default();
        if from_remote && let Err(e) = self.mirror.save(&events).await {
            tracing::warn!(error = %e, "failed to refresh event mirror");
        }
        events
    }

    /// Fetches one event. Never fails: unknown ids and errors both come
    /// back as `None`.
    pub async fn get_event(&self, id: EventId) -> Option<Event> {
        let ctx = self.context().await;
        let result = self.provider(ctx.backend).get(&ctx, id).await;
        let from_remote = ctx.backend.is_remote() && result.is_ok();
        let event = self
            .settle(OperationKind::Get, &ctx, result, self.mirror.get(&ctx, id))
            .await
            .ok()
            .flatten()?;
        if from_remote && let Err(e) = self.mirror.upsert(event.clone()).await {
            tracing::warn!(%id, error = %e, "failed to refresh mirrored event");
        }
        Some(event)
    }

    /// Creates an event owned by the signed-in user and puts it at the
    /// front of the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Unauthenticated`] when nobody is signed in
    /// (nothing is written anywhere), [`PlannerError::InvalidRequest`] for
    /// invalid input, or the provider's error.
    pub async fn create_event(&self, new: &NewEvent) -> Result<Event, PlannerError> {
        let ctx = self.context().await;
        if ctx.identity.is_none() {
            tracing::error!("create rejected: not authenticated");
            return Err(PlannerError::Unauthenticated);
        }
        new.validate()?;

        let result = self.provider(ctx.backend).create(&ctx, new).await;
        let from_remote = ctx.backend.is_remote() && result.is_ok();
        let event = self
            .settle(OperationKind::Create, &ctx, result, self.mirror.create(&ctx, new))
            .await?;
        if from_remote && let Err(e) = self.mirror.prepend(event.clone()).await {
            tracing::warn!(id = %event.id, error = %e, "failed to mirror created event");
        }
        tracing::info!(id = %event.id, backend = %ctx.backend, "event created");
        Ok(event)
    }

    /// Applies a partial update.
    ///
    /// Online, the remote record is updated and its mirror entry replaced.
    /// Offline, only the mirror changes and `updated_at` is stamped on the
    /// device.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::EventNotFound`] for unknown ids,
    /// [`PlannerError::InvalidRequest`] for invalid patches, or the
    /// provider's error.
    pub async fn update_event(
        &self,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError> {
        let ctx = self.context().await;
        patch.validate()?;

        let result = self.provider(ctx.backend).update(&ctx, id, patch).await;
        let from_remote = ctx.backend.is_remote() && result.is_ok();
        let event = self
            .settle(
                OperationKind::Update,
                &ctx,
                result,
                self.mirror.update(&ctx, id, patch),
            )
            .await?;
        if from_remote && let Err(e) = self.mirror.replace(event.clone()).await {
            tracing::warn!(%id, error = %e, "failed to mirror updated event");
        }
        tracing::info!(%id, backend = %ctx.backend, "event updated");
        Ok(event)
    }

    /// Deletes an event. Online, the remote delete happens first; a
    /// remote failure is returned and the mirror keeps the entry.
    ///
    /// # Errors
    ///
    /// Returns the remote provider's error, or a storage error when the
    /// mirror cannot be written on the local path.
    pub async fn delete_event(&self, id: EventId) -> Result<(), PlannerError> {
        let ctx = self.context().await;
        let result = self.provider(ctx.backend).delete(&ctx, id).await;
        let from_remote = ctx.backend.is_remote() && result.is_ok();
        self.settle(
            OperationKind::Delete,
            &ctx,
            result,
            self.mirror.delete(&ctx, id),
        )
        .await?;
        if from_remote && let Err(e) = self.mirror.remove(id).await {
            tracing::warn!(%id, error = %e, "failed to drop mirrored event");
        }
        tracing::info!(%id, backend = %ctx.backend, "event deleted");
        Ok(())
    }

    fn database(&self) -> Result<&DatabaseProvider, PlannerError> {
        self.database.as_ref().ok_or_else(|| {
            PlannerError::BackendUnavailable(
                "generated content requires a database connection".to_string(),
            )
        })
    }

    /// Stores generated content for one of the signed-in user's events.
    /// Goes straight to the database; content is not mirrored.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::BackendUnavailable`] without a database,
    /// [`PlannerError::Unauthenticated`] when nobody is signed in, or a
    /// persistence error.
    pub async fn save_generated_content(
        &self,
        new: &NewGeneratedContent,
    ) -> Result<GeneratedContent, PlannerError> {
        let database = self.database()?;
        let ctx = CallContext::new(Backend::Database, self.identity.resolve().await);
        database.save_content(&ctx, new).await.inspect_err(|e| {
            tracing::error!(event_id = %new.event_id, error = %e, "failed to save generated content");
        })
    }

    /// Lists content generated for an event, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::BackendUnavailable`] without a database, or
    /// a persistence error.
    pub async fn generated_content_for(
        &self,
        event_id: EventId,
    ) -> Result<Vec<GeneratedContent>, PlannerError> {
        let database = self.database()?;
        let ctx = CallContext::new(Backend::Database, self.identity.resolve().await);
        database.list_content(&ctx, event_id).await
    }
}
