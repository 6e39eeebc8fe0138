//! On-device key/value storage.
//!
//! Two scopes back the client: a session scope that lives as long as the
//! process ([`MemoryStore`]) and a persistent scope that survives restarts
//! ([`FileStore`]). [`DeviceStorage`] pairs them. The event mirror and the
//! identity record both live here.

pub mod file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::PlannerError;

/// String key/value storage used for the mirror and the identity record.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Returns the stored value, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Storage`] if the backing medium fails.
    async fn get(&self, key: &str) -> Result<Option<String>, PlannerError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Storage`] if the backing medium fails or the
    /// key is not allowed.
    async fn set(&self, key: &str, value: &str) -> Result<(), PlannerError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Storage`] if the backing medium fails.
    async fn remove(&self, key: &str) -> Result<(), PlannerError>;
}

/// The session and persistent storage scopes of one device.
#[derive(Debug, Clone)]
pub struct DeviceStorage {
    session: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
}

impl DeviceStorage {
    /// Pairs two stores as the session and persistent scopes.
    #[must_use]
    pub fn new(session: Arc<dyn KeyValueStore>, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session,
            persistent,
        }
    }

    /// Both scopes in memory. Nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Session scope in memory, persistent scope under `dir`.
    #[must_use]
    pub fn with_persistent_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(FileStore::new(dir)))
    }

    /// The session-scoped store.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn KeyValueStore> {
        &self.session
    }

    /// The persistent store.
    #[must_use]
    pub fn persistent(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistent
    }
}

/// Rejects keys that could escape a storage directory.
///
/// # Errors
///
/// Returns [`PlannerError::Storage`] unless the key is non-empty and made
/// of ASCII letters, digits, `_` and `-`.
pub fn validate_key(key: &str) -> Result<(), PlannerError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PlannerError::Storage(format!("invalid storage key: {key:?}")))
    }
}
