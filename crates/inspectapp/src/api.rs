//! # API Facade
//!
//! The single entry point for inspect operations, whatever the UI. The facade
//! owns the record store, the attachment store and the resolved paths, and
//! dispatches to `commands/*`.
//!
//! It does no business logic and no I/O of its own. Inputs are normalized
//! (field maps parsed into an [`NcrPatch`], the acting inspector turned into
//! an [`Author`]) and results come back as [`CmdResult`].
//!
//! ## Generic Over Storage
//!
//! `InspectApi<B, A>` is generic over the record backend and the attachment
//! store:
//! - Production: `InspectApi<FsBackend, FsAttachments>`
//! - Testing: `InspectApi<MemBackend, MemAttachments>`
//!
//! ## Record Kinds
//!
//! Plain kinds (geodetic, civil, remark, daily) go through the generic
//! `create` / `replace` / `merge` / `delete` methods. NCRs have their own
//! `ncr_*` methods, which enforce the lifecycle rules.

use crate::commands::dashboard::Dashboard;
use crate::commands::export::{ExportSelection, Tabular};
use crate::commands::list::{Filterable, RecordFilter};
use crate::commands::ncr::{NcrDefaults, NcrPatch};
use crate::commands::{self, CmdResult, Fields, InspectPaths};
use crate::error::Result;
use crate::model::{Author, NcrReport, PlainRecord, Record};
use crate::store::attachments::{AttachmentStore, IncomingFile};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;

pub struct InspectApi<B: StorageBackend, A: AttachmentStore> {
    store: RecordStore<B>,
    files: A,
    ncr_prefix: String,
    paths: InspectPaths,
}

impl<B: StorageBackend, A: AttachmentStore> InspectApi<B, A> {
    pub fn new(backend: B, files: A, ncr_prefix: impl Into<String>, paths: InspectPaths) -> Self {
        Self {
            store: RecordStore::with_backend(backend),
            files,
            ncr_prefix: ncr_prefix.into(),
            paths,
        }
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn files(&self) -> &A {
        &self.files
    }

    pub fn paths(&self) -> &InspectPaths {
        &self.paths
    }

    pub fn dashboard(&self) -> Dashboard {
        commands::dashboard::run(&self.store)
    }

    pub fn list<T: Filterable>(&self, filter: &RecordFilter) -> Result<CmdResult<T>> {
        commands::list::run(&self.store, filter)
    }

    pub fn show<T: Record>(&self, id: u64) -> Result<CmdResult<T>> {
        commands::records::show(&self.store, id)
    }

    pub fn export<T: Tabular>(&self, selection: &ExportSelection) -> Result<CmdResult<T>> {
        commands::export::run(&self.store, selection, &self.paths.export_dir)
    }

    pub fn create<T: PlainRecord>(&self, fields: &Fields, actor: &str) -> Result<CmdResult<T>> {
        commands::records::create(&self.store, fields, &Author::named(actor))
    }

    pub fn replace<T: PlainRecord>(&self, id: u64, fields: &Fields) -> Result<CmdResult<T>> {
        commands::records::replace(&self.store, id, fields)
    }

    pub fn merge<T: PlainRecord>(&self, id: u64, fields: &Fields) -> Result<CmdResult<T>> {
        commands::records::merge(&self.store, id, fields)
    }

    pub fn delete<T: PlainRecord>(&self, id: u64) -> Result<CmdResult<T>> {
        commands::records::delete(&self.store, id)
    }

    pub fn ncr_next_number(&self) -> String {
        commands::ncr::next_sequence_number(&self.store, &self.ncr_prefix)
    }

    pub fn ncr_defaults(&self) -> NcrDefaults {
        commands::ncr::last_ncr_defaults(&self.store)
    }

    pub fn ncr_create(
        &self,
        fields: &Fields,
        photos: &[IncomingFile],
        actor: &str,
    ) -> Result<CmdResult<NcrReport>> {
        let patch = NcrPatch::from_fields(fields)?;
        commands::ncr::create(
            &self.store,
            &self.files,
            &self.ncr_prefix,
            &patch,
            photos,
            &Author::named(actor),
        )
    }

    pub fn ncr_update(
        &self,
        id: u64,
        fields: &Fields,
        signed_scan_url: Option<&str>,
        actor: &str,
    ) -> Result<CmdResult<NcrReport>> {
        let patch = NcrPatch::from_fields(fields)?;
        commands::ncr::merge_update(&self.store, id, &patch, signed_scan_url, actor)
    }

    pub fn ncr_close(&self, id: u64, actor: &str) -> Result<CmdResult<NcrReport>> {
        commands::ncr::close(&self.store, id, actor)
    }

    pub fn ncr_remove_signed_scan(&self, id: u64) -> Result<CmdResult<NcrReport>> {
        commands::ncr::remove_signed_scan(&self.store, id)
    }

    pub fn ncr_add_photos(&self, id: u64, photos: &[IncomingFile]) -> Result<CmdResult<NcrReport>> {
        commands::ncr::add_photos(&self.store, &self.files, id, photos)
    }

    pub fn ncr_remove_photo(&self, id: u64, filename: &str) -> Result<CmdResult<NcrReport>> {
        commands::ncr::remove_photo(&self.store, &self.files, id, filename)
    }

    pub fn ncr_delete(&self, id: u64) -> Result<CmdResult<NcrReport>> {
        commands::ncr::delete(&self.store, &self.files, id)
    }
}
