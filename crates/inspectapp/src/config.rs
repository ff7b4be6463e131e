//! # Configuration
//!
//! Settings are loaded with [`confique`], in priority order:
//! 1. **Environment variables**: `INSPECT_NCR_PREFIX`, `INSPECT_INSPECTOR_NAME`, ...
//! 2. **Config file**: `<data_dir>/inspect.toml`, if present.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | `ncr_prefix` | `INSPECT_NCR_PREFIX` | `TSFS-AGMK-NCR-` |
//! | `inspector_name` | `INSPECT_INSPECTOR_NAME` | `Inspector` |
//! | `uploads_dir` | `INSPECT_UPLOADS_DIR` | `<data_dir>/uploads/ncr_photos` |
//! | `export_dir` | `INSPECT_EXPORT_DIR` | `<data_dir>/exports` |

use crate::commands::ncr::DEFAULT_PREFIX;
use crate::error::{InspectError, Result};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "inspect.toml";

/// Configuration for inspect, stored in `inspect.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InspectConfig {
    /// Prefix of NCR sequence numbers.
    #[config(env = "INSPECT_NCR_PREFIX", default = "TSFS-AGMK-NCR-")]
    pub ncr_prefix: String,

    /// Acting inspector when none is given on the command line.
    #[config(env = "INSPECT_INSPECTOR_NAME", default = "Inspector")]
    pub inspector_name: String,

    /// Where NCR photos are stored. Relative paths resolve against the data dir.
    #[config(env = "INSPECT_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Where exports are written. Relative paths resolve against the data dir.
    #[config(env = "INSPECT_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            ncr_prefix: DEFAULT_PREFIX.to_string(),
            inspector_name: "Inspector".to_string(),
            uploads_dir: None,
            export_dir: None,
        }
    }
}

impl InspectConfig {
    /// Load from the environment and `<data_dir>/inspect.toml`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::builder()
            .env()
            .file(data_dir.join(CONFIG_FILE_NAME))
            .load()
            .map_err(|e| InspectError::Config(e.to_string()))
    }

    pub fn uploads_dir(&self, data_dir: &Path) -> PathBuf {
        match &self.uploads_dir {
            Some(dir) => data_dir.join(dir),
            None => data_dir.join("uploads").join("ncr_photos"),
        }
    }

    pub fn export_dir(&self, data_dir: &Path) -> PathBuf {
        match &self.export_dir {
            Some(dir) => data_dir.join(dir),
            None => data_dir.join("exports"),
        }
    }
}
