//! On-device event mirror.
//!
//! The mirror is a JSON array of [`Event`] records stored under a single
//! key in persistent device storage. It is both the offline provider and
//! the cache the service keeps in sync after every remote call.
//!
//! Every mutation is a read-modify-write of the whole array without a
//! lock; two concurrent writers can lose an update.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{Backend, CallContext, EventProvider};
use crate::domain::{Event, EventId, EventPatch, NewEvent};
use crate::error::PlannerError;
use crate::storage::KeyValueStore;

/// Storage key of the mirror.
pub const MIRROR_KEY: &str = "planner_events";

/// The cached event list on this device.
#[derive(Debug, Clone)]
pub struct EventMirror {
    store: Arc<dyn KeyValueStore>,
}

impl EventMirror {
    /// Creates a mirror stored under [`MIRROR_KEY`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the mirrored list. Missing, unreadable or malformed content
    /// reads as an empty list.
    pub async fn load(&self) -> Vec<Event> {
        let raw = match self.store.get(MIRROR_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read event mirror");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "malformed event mirror, treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrites the mirrored list.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the write fails.
    pub async fn save(&self, events: &[Event]) -> Result<(), PlannerError> {
        let raw = serde_json::to_string(events)?;
        self.store.set(MIRROR_KEY, &raw).await
    }

    /// Inserts an event at the front of the list.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn prepend(&self, event: Event) -> Result<(), PlannerError> {
        let mut events = self.load().await;
        events.insert(0, event);
        self.save(&events).await
    }

    /// Replaces the entry with the same id. Returns `false`, and writes
    /// nothing, when no such entry exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn replace(&self, event: Event) -> Result<bool, PlannerError> {
        let mut events = self.load().await;
        let Some(slot) = events.iter_mut().find(|e| e.id == event.id) else {
            return Ok(false);
        };
        *slot = event;
        self.save(&events).await?;
        Ok(true)
    }

    /// Replaces the entry with the same id, or inserts it at the front
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn upsert(&self, event: Event) -> Result<(), PlannerError> {
        let mut events = self.load().await;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => events.insert(0, event),
        }
        self.save(&events).await
    }

    /// Removes the entry with the given id and persists the list.
    /// Returns whether an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub async fn remove(&self, id: EventId) -> Result<bool, PlannerError> {
        let mut events = self.load().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        let removed = events.len() != before;
        self.save(&events).await?;
        Ok(removed)
    }

    /// Linear scan for an id.
    pub async fn find(&self, id: EventId) -> Option<Event> {
        self.load().await.into_iter().find(|e| e.id == id)
    }
}

/// Serves only the caller's own records, the way row-level security
/// scopes the database. Anonymous callers see nothing and cannot write.
#[async_trait]
impl EventProvider for EventMirror {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    async fn list(&self, ctx: &CallContext) -> Result<Vec<Event>, PlannerError> {
        let Some(owner) = &ctx.identity else {
            return Ok(Vec::new());
        };
        let mut events = self.load().await;
        events.retain(|e| &e.user_id == owner);
        Ok(events)
    }

    async fn get(&self, ctx: &CallContext, id: EventId) -> Result<Option<Event>, PlannerError> {
        let Some(owner) = &ctx.identity else {
            return Ok(None);
        };
        Ok(self.find(id).await.filter(|e| &e.user_id == owner))
    }

    async fn create(&self, ctx: &CallContext, new: &NewEvent) -> Result<Event, PlannerError> {
        let owner = ctx.require_identity()?;
        new.validate()?;
        let event = new
            .clone()
            .into_event(EventId::new(), owner.clone(), Utc::now());
        self.prepend(event.clone()).await?;
        Ok(event)
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError> {
        let owner = ctx.require_identity()?;
        patch.validate()?;
        let mut events = self.load().await;
        let Some(event) = events
            .iter_mut()
            .find(|e| e.id == id && &e.user_id == owner)
        else {
            return Err(PlannerError::EventNotFound(id));
        };
        patch.apply_to(event);
        event.touch(Utc::now());
        let updated = event.clone();
        self.save(&events).await?;
        Ok(updated)
    }

    async fn delete(&self, ctx: &CallContext, id: EventId) -> Result<bool, PlannerError> {
        let owner = ctx.require_identity()?;
        let mut events = self.load().await;
        let before = events.len();
        events.retain(|e| e.id != id || &e.user_id != owner);
        if events.len() == before {
            return Ok(false);
        }
        self.save(&events).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::storage::MemoryStore;

    fn mirror() -> EventMirror {
        EventMirror::new(Arc::new(MemoryStore::new()))
    }

    fn ctx() -> CallContext {
        CallContext::new(Backend::Local, Some(UserId::from("u1")))
    }

    #[tokio::test]
    async fn create_prepends() {
        let mirror = mirror();
        let Ok(first) = mirror.create(&ctx(), &NewEvent::named("First")).await else {
            panic!("create failed");
        };
        let Ok(second) = mirror.create(&ctx(), &NewEvent::named("Second")).await else {
            panic!("create failed");
        };
        let ids: Vec<EventId> = mirror.load().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(first.user_id.as_str(), "u1");
    }

    #[tokio::test]
    async fn create_without_identity_writes_nothing() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mirror = EventMirror::new(Arc::clone(&store));
        let anonymous = CallContext::new(Backend::Local, None);
        let result = mirror.create(&anonymous, &NewEvent::named("Nope")).await;
        assert!(matches!(result, Err(PlannerError::Unauthenticated)));
        assert!(matches!(store.get(MIRROR_KEY).await, Ok(None)));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let mirror = mirror();
        let id = EventId::new();
        let result = mirror.update(&ctx(), id, &EventPatch::default()).await;
        assert!(matches!(result, Err(PlannerError::EventNotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn update_patches_and_touches() {
        let mirror = mirror();
        let Ok(created) = mirror.create(&ctx(), &NewEvent::named("Draft")).await else {
            panic!("create failed");
        };
        let patch = EventPatch {
            event_name: Some("Final".to_string()),
            ..EventPatch::default()
        };
        let Ok(updated) = mirror.update(&ctx(), created.id, &patch).await else {
            panic!("update failed");
        };
        assert_eq!(updated.event_name, "Final");
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(mirror.find(created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn replace_ignores_unknown_ids() {
        let mirror = mirror();
        let stranger = NewEvent::named("Elsewhere").into_event(
            EventId::new(),
            UserId::from("u2"),
            Utc::now(),
        );
        assert!(matches!(mirror.replace(stranger).await, Ok(false)));
        assert!(mirror.load().await.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let mirror = mirror();
        let Ok(created) = mirror.create(&ctx(), &NewEvent::named("Gone")).await else {
            panic!("create failed");
        };
        assert!(matches!(mirror.delete(&ctx(), created.id).await, Ok(true)));
        assert!(matches!(mirror.delete(&ctx(), created.id).await, Ok(false)));
        assert!(mirror.find(created.id).await.is_none());
    }

    #[tokio::test]
    async fn upsert_inserts_unknown_and_replaces_known() {
        let mirror = mirror();
        let Ok(existing) = mirror.create(&ctx(), &NewEvent::named("Existing")).await else {
            panic!("create failed");
        };
        let fetched = NewEvent::named("Fetched").into_event(
            EventId::new(),
            UserId::from("u1"),
            Utc::now(),
        );
        assert!(mirror.upsert(fetched.clone()).await.is_ok());
        let ids: Vec<EventId> = mirror.load().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![fetched.id, existing.id]);

        let mut renamed = existing.clone();
        renamed.event_name = "Renamed".to_string();
        assert!(mirror.upsert(renamed.clone()).await.is_ok());
        assert_eq!(mirror.load().await.len(), 2);
        assert_eq!(mirror.find(existing.id).await, Some(renamed));
    }

    #[tokio::test]
    async fn provider_is_scoped_to_the_caller() {
        let mirror = mirror();
        let Ok(mine) = mirror.create(&ctx(), &NewEvent::named("Mine")).await else {
            panic!("create failed");
        };
        let other = CallContext::new(Backend::Local, Some(UserId::from("u2")));
        let anonymous = CallContext::new(Backend::Local, None);

        assert!(matches!(mirror.list(&other).await, Ok(v) if v.is_empty()));
        assert!(matches!(mirror.list(&anonymous).await, Ok(v) if v.is_empty()));
        assert!(matches!(mirror.get(&other, mine.id).await, Ok(None)));
        assert!(matches!(mirror.get(&anonymous, mine.id).await, Ok(None)));
        assert!(matches!(
            mirror.update(&other, mine.id, &EventPatch::default()).await,
            Err(PlannerError::EventNotFound(_))
        ));
        assert!(matches!(
            mirror.update(&anonymous, mine.id, &EventPatch::default()).await,
            Err(PlannerError::Unauthenticated)
        ));
        assert!(matches!(mirror.delete(&other, mine.id).await, Ok(false)));
        assert!(matches!(
            mirror.delete(&anonymous, mine.id).await,
            Err(PlannerError::Unauthenticated)
        ));

        assert!(matches!(mirror.list(&ctx()).await, Ok(v) if v == vec![mine.clone()]));
        assert!(matches!(mirror.get(&ctx(), mine.id).await, Ok(Some(e)) if e == mine));
    }

    #[tokio::test]
    async fn malformed_mirror_reads_empty() {
        let store = Arc::new(MemoryStore::new());
        assert!(store.set(MIRROR_KEY, "{\"oops\":").await.is_ok());
        let mirror = EventMirror::new(store);
        assert!(mirror.load().await.is_empty());
    }
}
