use super::backend::StorageBackend;
use crate::error::{InspectError, Result};
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One pretty-printed `<collection>.json` per collection, all in one data directory.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(InspectError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn read_collection(&self, collection: &str) -> Result<Option<String>> {
        let path = self.collection_path(collection);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InspectError::Io(e)),
        }
    }

    fn write_collection(&self, collection: &str, content: &str) -> Result<()> {
        self.ensure_dir(&self.root)?;
        let target = self.collection_path(collection);

        // Atomic write
        let tmp_file = self
            .root
            .join(format!(".{}-{}.tmp", collection, Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(InspectError::Io)?;
        if let Err(e) = fs::rename(&tmp_file, &target) {
            let _ = fs::remove_file(&tmp_file);
            return Err(InspectError::Io(e));
        }
        Ok(())
    }

    fn quarantine_collection(&self, collection: &str) -> Result<Option<PathBuf>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(None);
        }
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let aside = self
            .root
            .join(format!("{}.json.corrupt-{}", collection, stamp));
        fs::rename(&path, &aside).map_err(InspectError::Io)?;
        Ok(Some(aside))
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }
}
