//! Directory-backed store, used as the persistent scope.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{KeyValueStore, validate_key};
use crate::error::PlannerError;

/// Stores each key as `<dir>/<key>.json`.
///
/// The directory is created on first write. Writes go to a temporary
/// sibling file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PlannerError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn storage_err(path: &Path, err: &std::io::Error) -> PlannerError {
    PlannerError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PlannerError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(&path, &e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PlannerError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_err(&self.dir, &e))?;

        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| storage_err(&tmp, &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_err(&path, &e))
    }

    async fn remove(&self, key: &str) -> Result<(), PlannerError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(&path, &e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let dir = tmp.path().join("nested");

        let store = FileStore::new(&dir);
        assert!(matches!(store.get("planner_events").await, Ok(None)));
        assert!(store.set("planner_events", "[]").await.is_ok());

        let reopened = FileStore::new(&dir);
        assert!(matches!(reopened.get("planner_events").await, Ok(Some(v)) if v == "[]"));
        assert!(dir.join("planner_events.json").exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let store = FileStore::new(tmp.path());
        assert!(store.set("user", "{}").await.is_ok());
        assert!(store.remove("user").await.is_ok());
        assert!(store.remove("user").await.is_ok());
        assert!(matches!(store.get("user").await, Ok(None)));
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let store = FileStore::new(tmp.path());
        assert!(matches!(
            store.set("../escape", "x").await,
            Err(PlannerError::Storage(_))
        ));
    }
}
