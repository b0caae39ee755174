//! Record store: a JSON document store keyed by collection name.
//!
//! This is the playground's equivalent of the browser-local storage the
//! account and snippet features persist into: collections of serde records
//! under string keys, optionally backed by a single JSON file on disk.
//! Malformed stored data is treated as absent and never raised to callers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Store handle shared between the account and snippet features.
pub type SharedStore = Arc<Mutex<RecordStore>>;

pub struct RecordStore {
    path: Option<PathBuf>,
    collections: HashMap<String, serde_json::Value>,
}

impl RecordStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            collections: HashMap::new(),
        }
    }

    /// Opens a file-backed store. A missing or unreadable file starts empty;
    /// so does one whose contents fail to parse.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let collections = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, serde_json::Value>>(&raw) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "store file is malformed, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        tracing::debug!(path = %path.display(), collections = collections.len(), "store opened");
        Self {
            path: Some(path),
            collections,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Returns the records stored under `key`. Missing or malformed data
    /// yields the empty collection.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(value) = self.collections.get(key) else {
            return Vec::new();
        };
        match serde_json::from_value(value.clone()) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(key, %err, "stored collection is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replaces the collection under `key`.
    pub fn put<T: Serialize>(&mut self, key: &str, records: &[T]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records)?;
        self.collections.insert(key.to_string(), value);
        self.flush()
    }

    /// Reads a single-record collection (e.g. the session pointer).
    pub fn get_one<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.collections.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(key, %err, "stored record is malformed, treating as absent");
                None
            }
        }
    }

    pub fn put_one<T: Serialize>(&mut self, key: &str, record: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.collections.insert(key.to_string(), value);
        self.flush()
    }

    /// Removes a collection. Removing a missing key is a no-op.
    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.collections.remove(key);
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_string_pretty(&self.collections)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
