//! Flat, name-keyed storage for uploaded files (NCR photos).
//!
//! The record store only tracks attachment *names*; the bytes live here.

use crate::error::{InspectError, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// A file handed in by the caller, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    /// Original client-side file name; may include directories.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Extension of the final path component, with its dot (`".jpg"`), or empty.
    pub fn extension(&self) -> String {
        let base = self
            .name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        Path::new(base)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }
}

pub trait AttachmentStore: Send + Sync {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Deleting a name that does not exist is not an error.
    fn delete(&self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> bool;

    fn path(&self, name: &str) -> PathBuf;
}

/// Attachments as plain files in one upload directory.
pub struct FsAttachments {
    dir: PathBuf,
}

impl FsAttachments {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(InspectError::Store(format!(
            "Invalid attachment name: {:?}",
            name
        )));
    }
    Ok(())
}

impl AttachmentStore for FsAttachments {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(InspectError::Io)?;
        }

        // Atomic write
        let tmp = self.dir.join(format!(".upload-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, bytes).map_err(InspectError::Io)?;
        if let Err(e) = fs::rename(&tmp, self.dir.join(name)) {
            let _ = fs::remove_file(&tmp);
            return Err(InspectError::Io(e));
        }
        tracing::debug!(name, size = bytes.len(), "attachment stored");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        match fs::remove_file(self.dir.join(name)) {
            Ok(()) => {
                tracing::debug!(name, "attachment deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InspectError::Io(e)),
        }
    }

    fn exists(&self, name: &str) -> bool {
        check_name(name).is_ok() && self.dir.join(name).is_file()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// In-memory attachments for testing.
#[derive(Default)]
pub struct MemAttachments {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl AttachmentStore for MemAttachments {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    fn path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("mem://uploads/{}", name))
    }
}
