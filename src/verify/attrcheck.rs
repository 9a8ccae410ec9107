//! Attribute verification
//!
//! Builds one map per side, then compares them by relative name. The policy
//! is deliberately cheap: presence for directories and symbolic links, size
//! plus modify-time ordering for regular files. Content only enters the
//! picture in the hash stage.

use crate::checkpoint::CheckpointMap;
use crate::error::{Result, SyncError};
use crate::location::Location;
use crate::meta::{EntryKind, EntryStatus};
use crate::scan;
use crate::storage::{RemoteStore, StoreContext};
use crate::verify::unix_now;

/// Enumerate both sides into maps for comparison.
///
/// Incremental scope consults the checkpoint on both sides, so entries that
/// already passed cost nothing; full scope rescans everything. The source
/// map always comes from the session's source address and the destination
/// map from its destination address.
pub fn build_maps(
    source: &Location,
    dest: &Location,
    with_attrs: bool,
    incremental: bool,
    checkpoint: &CheckpointMap,
    store_context: Option<&StoreContext>,
) -> Result<(CheckpointMap, CheckpointMap)> {
    let mut src_map = CheckpointMap::new();
    let mut dst_map = CheckpointMap::new();
    collect_side(
        source,
        with_attrs,
        incremental,
        checkpoint,
        store_context,
        &mut src_map,
    )?;
    collect_side(
        dest,
        with_attrs,
        incremental,
        checkpoint,
        store_context,
        &mut dst_map,
    )?;
    Ok((src_map, dst_map))
}

fn collect_side(
    side: &Location,
    with_attrs: bool,
    incremental: bool,
    checkpoint: &CheckpointMap,
    store_context: Option<&StoreContext>,
    into: &mut CheckpointMap,
) -> Result<()> {
    match side {
        Location::Path(root) => {
            if incremental {
                scan::fs::collect_incremental(root, with_attrs, checkpoint, into)
            } else {
                scan::fs::collect(root, with_attrs, into)
            }
        }
        Location::Store { bucket, prefix } => {
            let context = store_context
                .ok_or_else(|| SyncError::Runtime("object store context missing".to_string()))?;
            let store = RemoteStore::connect(context);
            if incremental {
                scan::object::collect_incremental(
                    &store, bucket, prefix, with_attrs, checkpoint, into,
                )
            } else {
                scan::object::collect(&store, bucket, prefix, with_attrs, into)
            }
        }
    }
}

/// Compare the two maps and produce a result map keyed like the source.
///
/// An entry missing from the destination fails. Directories and symbolic
/// links pass on presence. Regular files pass when sizes match and the
/// destination modify time is at least the source's.
pub fn compare(src_map: &CheckpointMap, dst_map: &CheckpointMap) -> CheckpointMap {
    let now = unix_now();
    let mut results = CheckpointMap::new();
    for (name, src_record) in src_map {
        let status = match dst_map.get(name) {
            None => EntryStatus::CheckFail,
            Some(dst_record) => match src_record.kind {
                EntryKind::Directory | EntryKind::Symlink => EntryStatus::CheckPass,
                EntryKind::File => {
                    if dst_record.size == src_record.size
                        && dst_record.mtime >= src_record.mtime
                    {
                        EntryStatus::CheckPass
                    } else {
                        EntryStatus::CheckFail
                    }
                }
            },
        };
        match status {
            EntryStatus::CheckPass => tracing::info!(name, "attribute check pass"),
            _ => tracing::info!(name, "attribute check fail"),
        }
        let mut record = src_record.clone();
        record.status = status;
        record.status_time = now;
        results.insert(name.clone(), record);
    }
    results
}
