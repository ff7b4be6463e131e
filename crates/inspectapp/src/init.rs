//! # Data Directory and Context
//!
//! Everything inspect stores lives under one data directory, resolved in order:
//!
//! 1. An explicit override (the CLI's `--data`).
//! 2. The `INSPECT_DATA` environment variable.
//! 3. The OS data directory for the application (via the `directories` crate),
//!    e.g. `~/.local/share/inspect` on Linux.
//! 4. `./.inspect` when the OS gives no data directory.
//!
//! Relative paths resolve against the current working directory. The
//! directory is not created here; the first write creates it.

use crate::api::InspectApi;
use crate::commands::InspectPaths;
use crate::config::{InspectConfig, CONFIG_FILE_NAME};
use crate::error::Result;
use crate::store::attachments::FsAttachments;
use crate::store::fs_backend::FsBackend;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_ENV: &str = "INSPECT_DATA";

pub struct InspectContext {
    pub api: InspectApi<FsBackend, FsAttachments>,
    pub config: InspectConfig,
}

fn absolute(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Pick the data directory from the candidates, first match wins.
pub fn choose_data_dir(
    cwd: &Path,
    data_override: Option<PathBuf>,
    env_value: Option<PathBuf>,
    os_data_dir: Option<PathBuf>,
) -> PathBuf {
    data_override
        .or(env_value.filter(|p| !p.as_os_str().is_empty()))
        .or(os_data_dir)
        .map(|path| absolute(cwd, path))
        .unwrap_or_else(|| cwd.join(".inspect"))
}

pub fn resolve_data_dir(cwd: &Path, data_override: Option<PathBuf>) -> PathBuf {
    let env_value = std::env::var_os(DATA_ENV).map(PathBuf::from);
    let os_data_dir = ProjectDirs::from("com", "inspect", "inspect")
        .map(|dirs| dirs.data_dir().to_path_buf());
    choose_data_dir(cwd, data_override, env_value, os_data_dir)
}

/// Resolve the data directory, load the configuration and build the API.
pub fn initialize(cwd: &Path, data_override: Option<PathBuf>) -> Result<InspectContext> {
    let data_dir = resolve_data_dir(cwd, data_override);
    let config = InspectConfig::load(&data_dir)?;

    let paths = InspectPaths {
        uploads_dir: config.uploads_dir(&data_dir),
        export_dir: config.export_dir(&data_dir),
        config_file: data_dir.join(CONFIG_FILE_NAME),
        data_dir: data_dir.clone(),
    };
    tracing::debug!(data_dir = %data_dir.display(), "data directory resolved");

    let api = InspectApi::new(
        FsBackend::new(data_dir),
        FsAttachments::new(paths.uploads_dir.clone()),
        config.ncr_prefix.clone(),
        paths,
    );
    Ok(InspectContext { api, config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let dir = choose_data_dir(
            Path::new("/work"),
            Some(PathBuf::from("site-data")),
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/os")),
        );
        assert_eq!(dir, PathBuf::from("/work/site-data"));
    }

    #[test]
    fn env_before_os_dir() {
        let dir = choose_data_dir(
            Path::new("/work"),
            None,
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/os")),
        );
        assert_eq!(dir, PathBuf::from("/env"));
    }

    #[test]
    fn empty_env_is_ignored() {
        let dir = choose_data_dir(
            Path::new("/work"),
            None,
            Some(PathBuf::new()),
            Some(PathBuf::from("/os")),
        );
        assert_eq!(dir, PathBuf::from("/os"));
    }

    #[test]
    fn falls_back_to_cwd() {
        let dir = choose_data_dir(Path::new("/work"), None, None, None);
        assert_eq!(dir, PathBuf::from("/work/.inspect"));
    }
}
