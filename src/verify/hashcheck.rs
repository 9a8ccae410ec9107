//! Content-hash verification
//!
//! Second-stage check for entries that passed the attribute comparison:
//! both sides of every attribute-passed regular file are read in full and
//! hashed with BLAKE3. Matching digests confirm the pass; anything else,
//! including an unreadable side, becomes a fail. Directories and symbolic
//! links keep their attribute outcome.
//!
//! The stage fans out over a worker pool fed from one queue. Each worker
//! owns a clone of the results sender and drops it on input exhaustion, so
//! the collector's channel closes exactly when the last worker finishes,
//! whatever order they finish in.

use std::io::Read;
use std::path::Path;

use crossbeam::channel::bounded;

use crate::checkpoint::CheckpointMap;
use crate::error::{IoResultExt, Result, SyncError};
use crate::location::{join_entry, Location};
use crate::meta::{EntryKind, EntryRecord, EntryStatus};
use crate::scratch::Scratch;
use crate::storage::{RemoteStore, StoreContext};
use crate::verify::unix_now;

/// Read buffer for streaming hashes.
const HASH_BUF_SIZE: usize = 1024 * 1024;

/// Stream a file through BLAKE3 and return the hex digest.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).with_path(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_BUF_SIZE];
    loop {
        let count = file.read(&mut buffer).with_path(path)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Re-check every attribute-passed regular file in `results` by content
/// hash, updating the map in place.
pub fn recheck(
    source: &Location,
    dest: &Location,
    results: &mut CheckpointMap,
    store_context: Option<&StoreContext>,
    workers: usize,
) -> Result<()> {
    let candidates: Vec<EntryRecord> = results
        .values()
        .filter(|r| r.status == EntryStatus::CheckPass && r.kind == EntryKind::File)
        .cloned()
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }
    let scratch = Scratch::new()?;
    let capacity = candidates.len();
    let (work_tx, work_rx) = bounded::<EntryRecord>(capacity);
    let (result_tx, result_rx) = bounded::<EntryRecord>(capacity);

    let mut rechecked = CheckpointMap::new();
    std::thread::scope(|scope| {
        scope.spawn(move || {
            for record in candidates {
                if work_tx.send(record).is_err() {
                    break;
                }
            }
        });
        for _ in 0..workers.max(1) {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let scratch = &scratch;
            scope.spawn(move || {
                let store = store_context.map(RemoteStore::connect);
                while let Ok(mut record) = work_rx.recv() {
                    record.status = check_one(source, dest, &record, store.as_ref(), scratch);
                    record.status_time = unix_now();
                    if result_tx.send(record).is_err() {
                        break;
                    }
                }
            });
        }
        drop(work_rx);
        drop(result_tx);
        // single collector; terminates once every worker has dropped its sender
        while let Ok(record) = result_rx.recv() {
            rechecked.insert(record.name.clone(), record);
        }
    });
    for (name, record) in rechecked {
        results.insert(name, record);
    }
    Ok(())
}

fn check_one(
    source: &Location,
    dest: &Location,
    record: &EntryRecord,
    store: Option<&RemoteStore>,
    scratch: &Scratch,
) -> EntryStatus {
    let src_hash = match hash_side(source, record, store, scratch) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::warn!(name = %record.name, %err, "source hash failed");
            return EntryStatus::CheckFail;
        }
    };
    let dst_hash = match hash_side(dest, record, store, scratch) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::warn!(name = %record.name, %err, "destination hash failed");
            return EntryStatus::CheckFail;
        }
    };
    if src_hash == dst_hash {
        tracing::info!(name = %record.name, "hash check pass");
        EntryStatus::CheckPass
    } else {
        tracing::info!(name = %record.name, "hash check fail");
        EntryStatus::CheckFail
    }
}

fn hash_side(
    side: &Location,
    record: &EntryRecord,
    store: Option<&RemoteStore>,
    scratch: &Scratch,
) -> Result<String> {
    match side {
        Location::Path(root) => hash_file(Path::new(&join_entry(root, &record.name))),
        Location::Store { bucket, prefix } => {
            let store = store
                .ok_or_else(|| SyncError::Runtime("object store context missing".to_string()))?;
            let key = format!("{prefix}{}", record.name);
            let staged = scratch.file()?;
            store.get_to_file(bucket, &key, staged.path(), record.size)?;
            hash_file(staged.path())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn passed_file(name: &str, size: u64) -> EntryRecord {
        EntryRecord {
            name: name.into(),
            kind: EntryKind::File,
            size,
            status: EntryStatus::CheckPass,
            ..Default::default()
        }
    }

    #[test]
    fn test_hash_file_is_content_addressed() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();
        std::fs::write(&c, b"sane bytes").unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
        assert_ne!(hash_file(&a).unwrap(), hash_file(&c).unwrap());
    }

    #[test]
    fn test_recheck_detects_same_size_corruption() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("f.bin"), b"correct!").unwrap();
        std::fs::write(dst.path().join("f.bin"), b"corrupt!").unwrap();

        let source = Location::parse(&src.path().display().to_string()).unwrap();
        let dest = Location::parse(&dst.path().display().to_string()).unwrap();
        let mut results = CheckpointMap::new();
        results.insert("f.bin".into(), passed_file("f.bin", 8));

        recheck(&source, &dest, &mut results, None, 2).unwrap();
        assert_eq!(results["f.bin"].status, EntryStatus::CheckFail);
    }

    #[test]
    fn test_recheck_confirms_identical_content() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("f.bin"), b"identical").unwrap();
        std::fs::write(dst.path().join("f.bin"), b"identical").unwrap();

        let source = Location::parse(&src.path().display().to_string()).unwrap();
        let dest = Location::parse(&dst.path().display().to_string()).unwrap();
        let mut results = CheckpointMap::new();
        results.insert("f.bin".into(), passed_file("f.bin", 9));

        recheck(&source, &dest, &mut results, None, 3).unwrap();
        assert_eq!(results["f.bin"].status, EntryStatus::CheckPass);
    }

    #[test]
    fn test_recheck_skips_non_files_and_failed_entries() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let source = Location::parse(&src.path().display().to_string()).unwrap();
        let dest = Location::parse(&dst.path().display().to_string()).unwrap();

        let mut dir_record = passed_file("d/", 0);
        dir_record.kind = EntryKind::Directory;
        let mut failed = passed_file("gone.txt", 4);
        failed.status = EntryStatus::CheckFail;

        let mut results = CheckpointMap::new();
        results.insert("d/".into(), dir_record);
        results.insert("gone.txt".into(), failed);

        recheck(&source, &dest, &mut results, None, 2).unwrap();
        // neither entry touches the filesystem; statuses are untouched
        assert_eq!(results["d/"].status, EntryStatus::CheckPass);
        assert_eq!(results["gone.txt"].status, EntryStatus::CheckFail);
    }

    #[test]
    fn test_recheck_unreadable_side_fails() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("f"), b"data").unwrap();
        // destination file missing entirely

        let source = Location::parse(&src.path().display().to_string()).unwrap();
        let dest = Location::parse(&dst.path().display().to_string()).unwrap();
        let mut results = CheckpointMap::new();
        results.insert("f".into(), passed_file("f", 4));

        recheck(&source, &dest, &mut results, None, 1).unwrap();
        assert_eq!(results["f"].status, EntryStatus::CheckFail);
    }
}
