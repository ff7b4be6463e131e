//! # Storage Layer
//!
//! Each collection (geodetic inspections, NCR reports, ...) is one JSON array
//! persisted as a unit. There is no index, no journal and no partial update:
//! every mutation reads the whole collection, changes it, and writes it back.
//!
//! ## Layers
//!
//! - [`backend::StorageBackend`]: raw text I/O for a named collection.
//!   - [`fs_backend::FsBackend`]: `<data_dir>/<collection>.json`, atomic tmp + rename writes.
//!   - [`mem_backend::MemBackend`]: in-memory, for tests.
//! - [`record_store::RecordStore`]: typed CRUD on top of a backend. Assigns ids,
//!   stamps timestamps and serializes access per collection.
//! - [`attachments::AttachmentStore`]: the bytes of uploaded files, by name.
//!
//! ## Failure Policy
//!
//! Reads favour availability: a missing or undecodable collection reads as
//! empty. Undecodable files are first moved aside (`<name>.json.corrupt-<ts>`)
//! so the next write cannot destroy the only copy. Writes never fail silently;
//! every mutation returns a `Result`.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//! ├── inspect.toml                 # Optional configuration
//! ├── geodetic_inspections.json
//! ├── civil_inspections.json
//! ├── ncr_reports.json
//! ├── remark_inspections.json
//! ├── daily_reports.json
//! ├── uploads/ncr_photos/          # ncr_<id>_<n>.<ext>
//! └── exports/                     # <collection>_<timestamp>.tar.gz
//! ```

pub mod attachments;
pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod record_store;

pub use record_store::RecordStore;
