//! Default root resolution for the filesystem store

use crate::{Error, Result};
use std::path::PathBuf;

/// Inputs for determining the store root directory
#[derive(Debug, Clone)]
struct RootInputs {
    override_dir: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    os_cache_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

fn root_from_inputs(inputs: RootInputs) -> Result<PathBuf> {
    // Resolution order (first writable wins):
    // 1) RENDERCACHE_STORE_DIR (explicit override)
    // 2) XDG_CACHE_HOME/rendercache/store
    // 3) OS cache dir/rendercache/store
    // 4) TMPDIR/rendercache/store (fallback)
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(dir) = inputs.override_dir.filter(|p| !p.as_os_str().is_empty()) {
        candidates.push(dir);
    }
    if let Some(xdg) = inputs.xdg_cache_home {
        candidates.push(xdg.join("rendercache/store"));
    }
    if let Some(os_cache) = inputs.os_cache_dir {
        candidates.push(os_cache.join("rendercache/store"));
    }
    candidates.push(inputs.temp_dir.join("rendercache/store"));

    for path in candidates {
        // If the path already exists, ensure it is writable; some CI
        // environments provide read-only cache directories under $HOME.
        if path.exists() {
            let probe = path.join(".write_probe");
            match std::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&probe)
            {
                Ok(_) => {
                    let _ = std::fs::remove_file(&probe);
                    return Ok(path);
                }
                Err(_) => {
                    // Not writable, try next candidate
                    continue;
                }
            }
        }
        if std::fs::create_dir_all(&path).is_ok() {
            return Ok(path);
        }
        // Permission denied or other errors - try next candidate
    }
    Err(Error::configuration(
        "Failed to determine a writable store directory",
    ))
}

/// Resolve the default root directory for [`crate::FilesystemStore`]
///
/// # Errors
///
/// Returns an error when no candidate directory is writable.
pub fn default_root() -> Result<PathBuf> {
    let inputs = RootInputs {
        override_dir: std::env::var("RENDERCACHE_STORE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        xdg_cache_home: std::env::var("XDG_CACHE_HOME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        os_cache_dir: dirs::cache_dir(),
        temp_dir: std::env::temp_dir(),
    };
    root_from_inputs(inputs)
}
