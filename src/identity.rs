//! Current-identity resolution from device storage.
//!
//! The auth provider leaves a JSON identity record on the device after
//! sign-in. [`IdentityResolver`] reads it back, session scope first, and
//! extracts its `id`. Resolution fails soft: a missing, unreadable or
//! malformed record means "nobody is signed in".

use std::sync::Arc;

use crate::domain::UserId;
use crate::error::PlannerError;
use crate::storage::{DeviceStorage, KeyValueStore};

/// Storage key of the identity record, in both scopes.
pub const IDENTITY_KEY: &str = "user";

/// Reads and writes the signed-in identity record.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    storage: DeviceStorage,
}

impl IdentityResolver {
    /// Creates a resolver over the given device storage.
    #[must_use]
    pub fn new(storage: DeviceStorage) -> Self {
        Self { storage }
    }

    /// Returns the current identity, or `None` when nobody is signed in.
    ///
    /// The session scope wins when it holds a record, even a malformed
    /// one. Errors are logged and never propagated.
    pub async fn resolve(&self) -> Option<UserId> {
        for (scope, store) in [
            ("session", self.storage.session()),
            ("persistent", self.storage.persistent()),
        ] {
            match store.get(IDENTITY_KEY).await {
                Ok(Some(raw)) => return parse_identity(scope, &raw),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(scope, error = %e, "failed to read identity record");
                    return None;
                }
            }
        }
        None
    }

    /// Stores an identity record. With `persist` the record goes to the
    /// persistent scope, otherwise to the session scope.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidRequest`] if the record has no usable
    /// `id`, or a storage error if the write fails.
    pub async fn sign_in(
        &self,
        record: &serde_json::Value,
        persist: bool,
    ) -> Result<UserId, PlannerError> {
        let user_id = extract_id(record).ok_or_else(|| {
            PlannerError::InvalidRequest("identity record has no id".to_string())
        })?;
        let store: &Arc<dyn KeyValueStore> = if persist {
            self.storage.persistent()
        } else {
            self.storage.session()
        };
        store
            .set(IDENTITY_KEY, &serde_json::to_string(record)?)
            .await?;
        tracing::info!(%user_id, persist, "identity stored");
        Ok(user_id)
    }

    /// Clears the identity record from both scopes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either removal fails.
    pub async fn sign_out(&self) -> Result<(), PlannerError> {
        self.storage.session().remove(IDENTITY_KEY).await?;
        self.storage.persistent().remove(IDENTITY_KEY).await
    }
}

fn parse_identity(scope: &str, raw: &str) -> Option<UserId> {
    let record = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(scope, error = %e, "malformed identity record");
            return None;
        }
    };
    let id = extract_id(&record);
    if id.is_none() {
        tracing::warn!(scope, "identity record has no id");
    }
    id
}

fn extract_id(record: &serde_json::Value) -> Option<UserId> {
    match record.get("id")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(UserId::new(s.as_str())),
        serde_json::Value::Number(n) => Some(UserId::new(n.to_string())),
        _ => None,
    }
}
