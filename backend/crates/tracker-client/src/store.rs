//! Persistent client-side state storage.
//!
//! The browser original kept its visitor id and consent decision in local
//! storage; here the equivalent is a small JSON file. Storage is a trait
//! so embedders can supply their own backing, and so the identity manager
//! can degrade to an explicit in-memory store when the file is
//! unavailable.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consent::ConsentDecision;

/// State persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    /// Durable per-browser-install visitor identifier.
    pub visitor_id: Option<Uuid>,
    /// Last recorded consent decision, if any.
    pub consent: Option<ConsentDecision>,
}

/// Errors raised by a state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state could not be read: {0}")]
    Read(String),
    #[error("state could not be written: {0}")]
    Write(String),
    #[error("state is corrupt: {0}")]
    Corrupt(String),
}

/// Backing storage for [`StoredState`].
pub trait StateStore {
    /// Load the stored state; `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<StoredState>, StoreError>;

    /// Persist the state, replacing any previous snapshot.
    fn save(&mut self, state: &StoredState) -> Result<(), StoreError>;
}

/// JSON-file-backed store, the durable default.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at the given path. Parent directories are created on
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<StoredState>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Read(err.to_string())),
        };
        let state = serde_json::from_slice(&raw)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &StoredState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Write(err.to_string()))?;
        }
        let raw = serde_json::to_vec_pretty(state)
            .map_err(|err| StoreError::Write(err.to_string()))?;
        fs::write(&self.path, raw).map_err(|err| StoreError::Write(err.to_string()))
    }
}

/// In-memory store holding state for this process only.
///
/// Used directly in tests and as the explicit degraded mode when the file
/// store is unavailable: identity still works, but a fresh identifier is
/// generated next launch.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Option<StoredState>,
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &StoredState) -> Result<(), StoreError> {
        self.state = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn file_store_round_trips_state() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FileStore::new(dir.path().join("tracker-state.json"));

        assert!(store.load().expect("load succeeds").is_none());

        let state = StoredState {
            visitor_id: Some(Uuid::new_v4()),
            consent: None,
        };
        store.save(&state).expect("save succeeds");
        assert_eq!(store.load().expect("load succeeds"), Some(state));
    }

    #[rstest]
    fn file_store_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FileStore::new(dir.path().join("nested/deeper/state.json"));
        store.save(&StoredState::default()).expect("save succeeds");
        assert!(store.load().expect("load succeeds").is_some());
    }

    #[rstest]
    fn corrupt_state_is_reported_not_silently_reset() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").expect("write fixture");

        let store = FileStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[rstest]
    fn memory_store_round_trips_state() {
        let mut store = MemoryStore::default();
        let state = StoredState {
            visitor_id: Some(Uuid::new_v4()),
            consent: None,
        };
        store.save(&state).expect("save succeeds");
        assert_eq!(store.load().expect("load succeeds"), Some(state));
    }
}
