//! Filesystem scanning
//!
//! Walks a directory root depth-first. Traversal errors are fatal to the
//! run; entries that vanish between the walk and their stat are skipped.

use std::path::Path;

use crossbeam::channel::Sender;
use walkdir::WalkDir;

use crate::checkpoint::CheckpointMap;
use crate::error::{Result, SyncError};
use crate::meta::fs::{stat_entry, stat_entry_minimal};
use crate::meta::{EntryRecord, EntryStatus};
use crate::scan::skip_name;

/// Enumerate a root into the work queue.
///
/// Unless this is a forced initial run, entries whose checkpoint status is
/// already check-pass are skipped before any stat work.
pub fn produce(
    root: &str,
    with_attrs: bool,
    initial: bool,
    checkpoint: &CheckpointMap,
    queue: &Sender<EntryRecord>,
) -> Result<()> {
    let skip_map = if initial { None } else { Some(checkpoint) };
    walk(root, with_attrs, skip_map, |record| {
        queue
            .send(record)
            .map_err(|_| SyncError::Runtime("work queue disconnected".to_string()))
    })
}

/// Enumerate every entry under a root into a map, for full verification.
pub fn collect(root: &str, with_attrs: bool, into: &mut CheckpointMap) -> Result<()> {
    walk(root, with_attrs, None, |record| {
        into.insert(record.name.clone(), record);
        Ok(())
    })
}

/// Enumerate entries not yet recorded as check-pass into a map, for
/// incremental verification.
pub fn collect_incremental(
    root: &str,
    with_attrs: bool,
    checkpoint: &CheckpointMap,
    into: &mut CheckpointMap,
) -> Result<()> {
    walk(root, with_attrs, Some(checkpoint), |record| {
        into.insert(record.name.clone(), record);
        Ok(())
    })
}

fn walk(
    root: &str,
    with_attrs: bool,
    checkpoint: Option<&CheckpointMap>,
    mut emit: impl FnMut(EntryRecord) -> Result<()>,
) -> Result<()> {
    let root_path = Path::new(root);
    for entry in WalkDir::new(root_path) {
        let entry = entry?;
        let bare = relative_name(root_path, entry.path())?;
        let mut name = bare.clone();
        if entry.file_type().is_dir() {
            name.push('/');
        }
        if skip_name(&name) {
            continue;
        }
        if let Some(map) = checkpoint {
            if map.get(&name).map(|r| r.status) == Some(EntryStatus::CheckPass) {
                tracing::debug!(name, "already check-pass, skipping");
                continue;
            }
        }
        let record = if with_attrs {
            stat_entry(entry.path(), &bare)
        } else {
            stat_entry_minimal(entry.path(), &bare)
        };
        if record.status == EntryStatus::NotFound {
            continue;
        }
        emit(record)?;
    }
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| SyncError::RelativePath {
            root: root.to_path_buf(),
            path: path.to_path_buf(),
        })?;
    Ok(rel.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::EntryKind;
    use crossbeam::channel::bounded;
    use tempfile::TempDir;

    fn build_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"bb").unwrap();
        std::os::unix::fs::symlink("a.txt", dir.path().join("link")).unwrap();
        dir
    }

    fn root_of(dir: &TempDir) -> String {
        format!("{}/", dir.path().display())
    }

    #[test]
    fn test_collect_full_tree() {
        let dir = build_tree();
        let mut map = CheckpointMap::new();
        collect(&root_of(&dir), true, &mut map).unwrap();

        let mut names: Vec<_> = map.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "link", "sub/", "sub/b.txt"]);
        assert_eq!(map["sub/"].kind, EntryKind::Directory);
        assert_eq!(map["link"].kind, EntryKind::Symlink);
    }

    #[test]
    fn test_root_itself_not_emitted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        let mut map = CheckpointMap::new();
        collect(&root_of(&dir), true, &mut map).unwrap();
        let names: Vec<_> = map.keys().cloned().collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn test_collect_incremental_skips_passed_entries() {
        let dir = build_tree();
        let mut checkpoint = CheckpointMap::new();
        checkpoint.insert(
            "a.txt".into(),
            EntryRecord {
                name: "a.txt".into(),
                status: EntryStatus::CheckPass,
                ..Default::default()
            },
        );
        checkpoint.insert(
            "sub/".into(),
            EntryRecord {
                name: "sub/".into(),
                status: EntryStatus::CheckFail,
                ..Default::default()
            },
        );

        let mut map = CheckpointMap::new();
        collect_incremental(&root_of(&dir), true, &checkpoint, &mut map).unwrap();
        assert!(!map.contains_key("a.txt"));
        // a failed prior status does not suppress the rescan
        assert!(map.contains_key("sub/"));
        assert!(map.contains_key("sub/b.txt"));
    }

    #[test]
    fn test_produce_fills_queue_and_initial_ignores_checkpoint() {
        let dir = build_tree();
        let mut checkpoint = CheckpointMap::new();
        checkpoint.insert(
            "a.txt".into(),
            EntryRecord {
                name: "a.txt".into(),
                status: EntryStatus::CheckPass,
                ..Default::default()
            },
        );

        let (tx, rx) = bounded(64);
        produce(&root_of(&dir), true, true, &checkpoint, &tx).unwrap();
        drop(tx);
        let names: Vec<_> = rx.iter().map(|r| r.name).collect();
        assert!(names.contains(&"a.txt".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_produce_incremental_skips_passed() {
        let dir = build_tree();
        let mut checkpoint = CheckpointMap::new();
        checkpoint.insert(
            "a.txt".into(),
            EntryRecord {
                name: "a.txt".into(),
                status: EntryStatus::CheckPass,
                ..Default::default()
            },
        );

        let (tx, rx) = bounded(64);
        produce(&root_of(&dir), true, false, &checkpoint, &tx).unwrap();
        drop(tx);
        let names: Vec<_> = rx.iter().map(|r| r.name).collect();
        assert!(!names.contains(&"a.txt".to_string()));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_records_are_stamped_in_copy() {
        let dir = build_tree();
        let mut map = CheckpointMap::new();
        collect(&root_of(&dir), false, &mut map).unwrap();
        assert!(map.values().all(|r| r.status == EntryStatus::InCopy));
    }
}
