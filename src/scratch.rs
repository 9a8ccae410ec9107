//! Scratch space for staging remote content
//!
//! Hash verification of object-store sides downloads each body to a local
//! file first. All of those land in one per-run directory with unique names;
//! the directory and anything left in it vanish when the run ends.

use tempfile::{NamedTempFile, TempDir};

use crate::error::{IoResultExt, Result};

/// Per-run scratch directory.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch directory for this run.
    pub fn new() -> Result<Scratch> {
        let dir = tempfile::Builder::new()
            .prefix("attrsync-")
            .tempdir()
            .with_path(std::env::temp_dir())?;
        Ok(Scratch { dir })
    }

    /// Create a uniquely named scratch file, removed when the handle drops.
    pub fn file(&self) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .tempfile_in(self.dir.path())
            .with_path(self.dir.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scratch_files_are_unique_and_cleaned() {
        let scratch = Scratch::new().unwrap();
        let mut a = scratch.file().unwrap();
        let b = scratch.file().unwrap();
        assert_ne!(a.path(), b.path());

        a.write_all(b"staged").unwrap();
        let a_path = a.path().to_path_buf();
        assert!(a_path.exists());
        drop(a);
        assert!(!a_path.exists());
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let scratch = Scratch::new().unwrap();
        let dir_path = scratch.dir.path().to_path_buf();
        assert!(dir_path.is_dir());
        drop(scratch);
        assert!(!dir_path.exists());
    }
}
