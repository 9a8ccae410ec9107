//! Filesystem metadata normalization
//!
//! Builds entry records from `lstat` results. Lookups never follow symbolic
//! links; a failed lookup produces a not-found marker instead of an error so
//! scans keep moving past entries that vanish mid-run.

use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::meta::record::{EntryKind, EntryRecord, EntryStatus};

/// Normalize one filesystem entry with full attributes.
///
/// `name` is the relative name without the directory suffix; the suffix is
/// appended here once the entry type is known.
pub fn stat_entry(path: &Path, name: &str) -> EntryRecord {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "stat failed");
            return EntryRecord::not_found(name);
        }
    };
    let Some(kind) = EntryKind::from_file_type(meta.file_type()) else {
        tracing::debug!(path = %path.display(), "unsupported entry type");
        return EntryRecord::not_found(name);
    };
    EntryRecord {
        name: shape_name(name, kind),
        meta_present: true,
        uid: meta.uid(),
        gid: meta.gid(),
        kind,
        perm: format!("{:03o}", meta.mode() & 0o777),
        atime: meta.atime(),
        mtime: meta.mtime(),
        size: meta.size(),
        status: EntryStatus::InCopy,
        status_time: 0,
    }
}

/// Normalize one filesystem entry without owner/group/permission decoding.
///
/// Only the type, size, and timestamps are recorded. Non-directories are all
/// treated as regular files in this variant.
pub fn stat_entry_minimal(path: &Path, name: &str) -> EntryRecord {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "stat failed");
            return EntryRecord::not_found(name);
        }
    };
    let kind = if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    EntryRecord {
        name: shape_name(name, kind),
        kind,
        atime: meta.atime(),
        mtime: meta.mtime(),
        size: meta.size(),
        status: EntryStatus::InCopy,
        ..Default::default()
    }
}

fn shape_name(name: &str, kind: EntryKind) -> String {
    if kind == EntryKind::Directory {
        format!("{name}/")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_stat_regular_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        let record = stat_entry(&path, "a.txt");
        assert_eq!(record.kind, EntryKind::File);
        assert_eq!(record.name, "a.txt");
        assert_eq!(record.perm, "640");
        assert_eq!(record.size, 5);
        assert!(record.meta_present);
        assert_eq!(record.status, EntryStatus::InCopy);
    }

    #[test]
    fn test_stat_directory_gets_trailing_slash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub");
        std::fs::create_dir(&path).unwrap();

        let record = stat_entry(&path, "sub");
        assert_eq!(record.kind, EntryKind::Directory);
        assert_eq!(record.name, "sub/");
    }

    #[test]
    fn test_stat_symlink_is_not_followed() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"content").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let record = stat_entry(&link, "link");
        assert_eq!(record.kind, EntryKind::Symlink);
        assert_eq!(record.name, "link");
    }

    #[test]
    fn test_stat_missing_entry_marks_not_found() {
        let dir = TempDir::new().unwrap();
        let record = stat_entry(&dir.path().join("gone"), "gone");
        assert_eq!(record.status, EntryStatus::NotFound);
    }

    #[test]
    fn test_minimal_variant_skips_ownership() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("t");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let record = stat_entry_minimal(&link, "link");
        assert!(!record.meta_present);
        assert_eq!(record.perm, "");
        // symlinks are not distinguished in the minimal variant
        assert_eq!(record.kind, EntryKind::File);
    }
}
