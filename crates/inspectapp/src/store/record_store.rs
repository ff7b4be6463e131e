use super::backend::StorageBackend;
use crate::error::{InspectError, Result};
use crate::model::{timestamp, Record};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Typed CRUD over named collections.
///
/// Every operation is a whole-collection read-modify-write performed while
/// holding that collection's lock, so two callers in this process can no
/// longer interleave between the read and the write. Separate processes
/// writing the same files still race; the last writer wins.
pub struct RecordStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    locks: Mutex<HashMap<&'static str, Arc<Mutex<()>>>>,
}

impl<B: StorageBackend> RecordStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn collection_lock(&self, collection: &'static str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(collection)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read the full collection. Missing, unreadable or corrupt storage reads as empty.
    pub fn load<T: Record>(&self) -> Vec<T> {
        let lock = self.collection_lock(T::COLLECTION);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.read_all::<T>() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "collection unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the full collection.
    pub fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        let lock = self.collection_lock(T::COLLECTION);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_all(records)
    }

    /// Append a record, assigning `id = max(existing) + 1` and stamping `created_at`.
    pub fn add<T: Record>(&self, record: T) -> Result<T> {
        self.insert_with(|_, _| Ok(record))
    }

    /// Like [`add`](Self::add), but the record is built under the same lock from
    /// the snapshot it is inserted into and the id it is about to receive.
    pub fn insert_with<T, F>(&self, build: F) -> Result<T>
    where
        T: Record,
        F: FnOnce(&[T], u64) -> Result<T>,
    {
        let lock = self.collection_lock(T::COLLECTION);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.read_all::<T>()?;
        let id = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
        let mut record = build(&records, id)?;

        let meta = record.meta_mut();
        meta.id = id;
        meta.created_at = timestamp();
        meta.updated_at = None;

        records.push(record.clone());
        self.write_all(&records)?;
        tracing::info!(collection = T::COLLECTION, id, "record added");
        Ok(record)
    }

    /// Full replace: the stored body becomes `record`, except `id` and
    /// `created_at`, which are kept from the stored version. Fields absent from
    /// `record` are lost; use [`patch`](Self::patch) to change individual fields.
    pub fn update<T: Record>(&self, id: u64, record: T) -> Result<T> {
        self.patch(id, move |current: &mut T| {
            *current = record;
            Ok(())
        })
    }

    /// Read-modify-write of one record. `edit` sees the stored record; if it
    /// returns an error nothing is written.
    pub fn patch<T, F>(&self, id: u64, edit: F) -> Result<T>
    where
        T: Record,
        F: FnOnce(&mut T) -> Result<()>,
    {
        let lock = self.collection_lock(T::COLLECTION);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.read_all::<T>()?;
        let pos = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| InspectError::not_found(T::COLLECTION, id))?;

        let prior = records[pos].meta().clone();
        let mut record = records[pos].clone();
        edit(&mut record)?;

        let meta = record.meta_mut();
        meta.id = prior.id;
        meta.created_at = prior.created_at;
        meta.updated_at = Some(stamp_after(prior.updated_at.as_deref()));

        records[pos] = record.clone();
        self.write_all(&records)?;
        tracing::info!(collection = T::COLLECTION, id, "record updated");
        Ok(record)
    }

    pub fn get<T: Record>(&self, id: u64) -> Option<T> {
        self.load::<T>().into_iter().find(|r| r.id() == id)
    }

    /// Remove a record permanently, returning it.
    pub fn delete<T: Record>(&self, id: u64) -> Result<T> {
        let lock = self.collection_lock(T::COLLECTION);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.read_all::<T>()?;
        let pos = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| InspectError::not_found(T::COLLECTION, id))?;
        let removed = records.remove(pos);

        self.write_all(&records)?;
        tracing::info!(collection = T::COLLECTION, id, "record deleted");
        Ok(removed)
    }

    /// Reads the collection for a mutation. A storage read error is returned,
    /// as is a corrupt collection that could not be quarantined; writing over
    /// either would destroy data. Quarantined content reads as empty.
    fn read_all<T: Record>(&self) -> Result<Vec<T>> {
        let Some(content) = self.backend.read_collection(T::COLLECTION)? else {
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(records) => {
                tracing::debug!(
                    collection = T::COLLECTION,
                    count = records.len(),
                    "collection loaded"
                );
                Ok(records)
            }
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    error = %e,
                    "collection is corrupt, moving it aside"
                );
                match self.backend.quarantine_collection(T::COLLECTION) {
                    Ok(Some(aside)) => tracing::warn!(
                        collection = T::COLLECTION,
                        path = %aside.display(),
                        "corrupt collection preserved"
                    ),
                    Ok(None) => {}
                    Err(qe) => {
                        return Err(InspectError::Store(format!(
                            "{} is corrupt and could not be moved aside: {}",
                            T::COLLECTION,
                            qe
                        )))
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    fn write_all<T: Record>(&self, records: &[T]) -> Result<()> {
        let content = serde_json::to_string_pretty(records).map_err(InspectError::Serialization)?;
        self.backend.write_collection(T::COLLECTION, &content)?;
        tracing::debug!(
            collection = T::COLLECTION,
            count = records.len(),
            "collection saved"
        );
        Ok(())
    }
}

/// A fresh timestamp, never earlier than `prior`.
fn stamp_after(prior: Option<&str>) -> String {
    let now = timestamp();
    match prior {
        Some(prior) if prior > now.as_str() => prior.to_string(),
        _ => now,
    }
}
