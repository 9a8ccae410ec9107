//! Copy executors
//!
//! One submodule per copy mode, each with a directory, regular-file, and
//! symbolic-link executor. Executors are independent per entry: a failure is
//! logged by the worker and the pool moves on. Every success emits a
//! completion notice naming the relative entry.

pub mod attrs;
pub mod download;
pub mod local;
pub mod remote;
pub mod upload;

use std::path::Path;

use crate::error::{IoResultExt, Result, SyncError};

/// Create the parent directory chain for a destination file.
pub(crate) fn ensure_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent).with_path(parent)?;
    }
    Ok(())
}

/// Point a symbolic link at `target`, replacing any stale link or file
/// already sitting at `dst`.
pub(crate) fn replace_symlink(target: &Path, dst: &Path) -> Result<()> {
    match std::fs::remove_file(dst) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(SyncError::io(dst, err)),
    }
    std::os::unix::fs::symlink(target, dst).with_path(dst)
}
