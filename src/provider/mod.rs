//! Storage providers behind one event CRUD interface.
//!
//! Three interchangeable implementations of [`EventProvider`]:
//!
//! | Provider             | Backend                | Reaches                       |
//! |----------------------|------------------------|-------------------------------|
//! | [`RestProvider`]     | [`Backend::Rest`]      | the REST backend over HTTP    |
//! | [`DatabaseProvider`] | [`Backend::Database`]  | PostgreSQL directly           |
//! | [`EventMirror`]      | [`Backend::Local`]     | the on-device mirror          |
//!
//! The service picks one per call and records the choice, together with
//! the caller's identity, in a [`CallContext`].

pub mod database;
pub mod mirror;
pub mod rest;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub use database::DatabaseProvider;
pub use mirror::EventMirror;
pub use rest::RestProvider;

use crate::domain::{Event, EventId, EventPatch, NewEvent, UserId};
use crate::error::PlannerError;

/// Default timeout of the REST and database liveness probes.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Which storage path serves a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Live REST backend.
    Rest,
    /// Direct relational store client.
    Database,
    /// On-device mirror only.
    Local,
}

impl Backend {
    /// `true` for paths that leave the device.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rest => "rest",
            Self::Database => "database",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// Per-call state: the selected backend and the resolved identity.
///
/// Built once at the start of every service call and passed down,
/// so liveness is never shared between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Backend selected for this call.
    pub backend: Backend,
    /// Signed-in user, if any.
    pub identity: Option<UserId>,
}

impl CallContext {
    /// Creates a context.
    #[must_use]
    pub fn new(backend: Backend, identity: Option<UserId>) -> Self {
        Self { backend, identity }
    }

    /// Returns the identity or fails.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Unauthenticated`] when nobody is signed in.
    pub fn require_identity(&self) -> Result<&UserId, PlannerError> {
        self.identity.as_ref().ok_or(PlannerError::Unauthenticated)
    }
}

/// Event CRUD against one storage path.
#[async_trait]
pub trait EventProvider: Send + Sync + fmt::Debug {
    /// The backend this provider represents.
    fn backend(&self) -> Backend;

    /// Lists the caller's events, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError`] if the underlying store fails.
    async fn list(&self, ctx: &CallContext) -> Result<Vec<Event>, PlannerError>;

    /// Fetches one event; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError`] if the underlying store fails.
    async fn get(&self, ctx: &CallContext, id: EventId) -> Result<Option<Event>, PlannerError>;

    /// Creates an event owned by the context identity.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Unauthenticated`] without an identity, or a
    /// store error.
    async fn create(&self, ctx: &CallContext, new: &NewEvent) -> Result<Event, PlannerError>;

    /// Applies a partial update and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::EventNotFound`] for unknown ids, or a store
    /// error.
    async fn update(
        &self,
        ctx: &CallContext,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError>;

    /// Deletes an event. Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError`] if the underlying store fails.
    async fn delete(&self, ctx: &CallContext, id: EventId) -> Result<bool, PlannerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_stays_on_device() {
        assert!(Backend::Rest.is_remote());
        assert!(Backend::Database.is_remote());
        assert!(!Backend::Local.is_remote());
    }

    #[test]
    fn require_identity() {
        let anonymous = CallContext::new(Backend::Local, None);
        assert!(matches!(
            anonymous.require_identity(),
            Err(PlannerError::Unauthenticated)
        ));
        let signed_in = CallContext::new(Backend::Local, Some(UserId::from("u1")));
        assert!(matches!(signed_in.require_identity(), Ok(id) if id.as_str() == "u1"));
    }
}
