use crate::error::Result;
use std::path::PathBuf;

/// Abstract interface for raw collection I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `RecordStore` handles the "what" (identity, timestamps, typing, locking).
///
/// Implementations must be shareable across threads; the record store
/// serializes access per collection, not per backend.
pub trait StorageBackend: Send + Sync {
    /// Read the serialized collection.
    /// Returns Ok(None) if the collection has never been written.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read_collection(&self, collection: &str) -> Result<Option<String>>;

    /// Replace the serialized collection.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_collection(&self, collection: &str, content: &str) -> Result<()>;

    /// Move an unreadable collection out of the way so the next write does not
    /// destroy it. Returns where it went, if anywhere.
    fn quarantine_collection(&self, collection: &str) -> Result<Option<PathBuf>>;

    /// The "file path" for the collection.
    /// For FsBackend, this is the real path. For MemBackend, a virtual path.
    fn collection_path(&self, collection: &str) -> PathBuf;
}
