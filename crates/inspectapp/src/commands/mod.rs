//! # Command Layer
//!
//! The business logic of inspect. Each command module exposes plain functions
//! that take a [`RecordStore`](crate::store::RecordStore) (and, where files are
//! involved, an [`AttachmentStore`](crate::store::attachments::AttachmentStore))
//! and return structured data.
//!
//! Commands never print, prompt or exit. They return [`CmdResult`] carrying the
//! affected records and leveled messages; the presentation layer decides how
//! to render them and which failures become which exit codes.
//!
//! ## Command Modules
//!
//! - [`records`]: generic create / replace / merge / show / delete for the
//!   kinds without a lifecycle
//! - [`list`]: filtering and ordering for listings
//! - [`ncr`]: the NCR lifecycle: numbering, merge updates, photos, close
//! - [`dashboard`]: per-collection totals
//! - [`export`]: filtered `.tar.gz` exports (TSV + JSON)
//!
//! Tests for every module run against `MemBackend` and `MemAttachments`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod dashboard;
pub mod export;
pub mod list;
pub mod ncr;
pub mod records;

/// Caller-supplied field values, keyed by their stored JSON name.
pub type Fields = BTreeMap<String, String>;

/// Resolved locations of everything inspect writes.
#[derive(Debug, Clone, Serialize)]
pub struct InspectPaths {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub export_dir: PathBuf,
    pub config_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Info, content)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Success, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, content)
    }

    fn new(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }
}

/// What a command produced: records, file paths and messages.
#[derive(Debug)]
pub struct CmdResult<T> {
    pub records: Vec<T>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

// Manual impl: a derive would demand `T: Default`.
impl<T> Default for CmdResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            paths: Vec::new(),
            messages: Vec::new(),
        }
    }
}

impl<T> CmdResult<T> {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_records(mut self, records: Vec<T>) -> Self {
        self.records = records;
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    pub fn has_level(&self, level: MessageLevel) -> bool {
        self.messages.iter().any(|m| m.level == level)
    }
}
