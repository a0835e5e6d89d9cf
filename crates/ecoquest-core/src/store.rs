//! Key-value snapshot persistence.
//!
//! The storage contract is deliberately small: JSON strings under fixed
//! keys, read in full at startup and written back in full after each
//! mutating operation. Callers serialize writes — there is no multi-writer
//! support and none is needed for a single-user client.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Fixed storage key for the plant registry snapshot.
pub const REGISTRY_KEY: &str = "saved_plants_history_v2";
/// Fixed storage key for the persisted mission state.
pub const MISSION_KEY: &str = "disaster_detective/state";
/// Fixed storage key for the tutorial-seen flag.
pub const TUTORIAL_SEEN_KEY: &str = "disaster_detective/tutorial_seen";

/// A string key-value store holding JSON snapshots.
pub trait SnapshotStore {
    /// The value under `key`, or `None` if never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replace the value under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value)
    }
}

/// In-memory store for tests and the simtest harness.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one `.json` file per key under a base directory.
/// `/` in a key maps to a subdirectory.
#[derive(Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.base.clone();
        for part in key.split('/') {
            path.push(part);
        }
        path.set_extension("json");
        path
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, value)?;
        Ok(())
    }
}

/// Errors from reading or writing snapshots.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Json(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}
