use super::backend::StorageBackend;
use crate::error::{InspectError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory storage backend for testing.
///
/// Holds each collection as its serialized text, so tests exercise the same
/// encode/decode path as the filesystem backend.
#[derive(Default)]
pub struct MemBackend {
    collections: Mutex<HashMap<String, String>>,
    quarantined: Mutex<Vec<(String, String)>>,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper to plant raw (possibly corrupt) content for a collection.
    pub fn put_raw(&self, collection: &str, content: &str) {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string(), content.to_string());
    }

    /// Test helper returning the raw serialized collection.
    pub fn raw(&self, collection: &str) -> Option<String> {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .cloned()
    }

    /// Collections moved aside by quarantine, oldest first.
    pub fn quarantined(&self) -> Vec<(String, String)> {
        self.quarantined
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StorageBackend for MemBackend {
    fn read_collection(&self, collection: &str) -> Result<Option<String>> {
        Ok(self.raw(collection))
    }

    fn write_collection(&self, collection: &str, content: &str) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(InspectError::Store("Simulated write error".to_string()));
        }
        self.put_raw(collection, content);
        Ok(())
    }

    fn quarantine_collection(&self, collection: &str) -> Result<Option<PathBuf>> {
        let removed = self
            .collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(collection);
        match removed {
            Some(content) => {
                self.quarantined
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((collection.to_string(), content));
                Ok(Some(PathBuf::from(format!(
                    "mem://{}.json.corrupt",
                    collection
                ))))
            }
            None => Ok(None),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        PathBuf::from(format!("mem://{}.json", collection))
    }
}
