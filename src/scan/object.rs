//! Object-store scanning
//!
//! Pages through a bucket prefix with a listing cursor. A failed page fetch
//! logs and ends the listing; everything already emitted keeps flowing.
//! The checkpoint skip is applied before the per-entry point lookup, so
//! unchanged entries cost a listing row and nothing more.

use crossbeam::channel::Sender;

use crate::checkpoint::CheckpointMap;
use crate::error::{Result, SyncError};
use crate::meta::object::{head_entry, listed_entry};
use crate::meta::{EntryRecord, EntryStatus};
use crate::scan::skip_name;
use crate::storage::RemoteStore;

/// Enumerate a bucket prefix into the work queue.
pub fn produce(
    store: &RemoteStore,
    bucket: &str,
    prefix: &str,
    with_attrs: bool,
    initial: bool,
    checkpoint: &CheckpointMap,
    queue: &Sender<EntryRecord>,
) -> Result<()> {
    let skip_map = if initial { None } else { Some(checkpoint) };
    list(store, bucket, prefix, with_attrs, skip_map, |record| {
        queue
            .send(record)
            .map_err(|_| SyncError::Runtime("work queue disconnected".to_string()))
    })
}

/// Enumerate every object under a prefix into a map, for full verification.
pub fn collect(
    store: &RemoteStore,
    bucket: &str,
    prefix: &str,
    with_attrs: bool,
    into: &mut CheckpointMap,
) -> Result<()> {
    list(store, bucket, prefix, with_attrs, None, |record| {
        into.insert(record.name.clone(), record);
        Ok(())
    })
}

/// Enumerate objects not yet recorded as check-pass into a map, for
/// incremental verification.
pub fn collect_incremental(
    store: &RemoteStore,
    bucket: &str,
    prefix: &str,
    with_attrs: bool,
    checkpoint: &CheckpointMap,
    into: &mut CheckpointMap,
) -> Result<()> {
    list(store, bucket, prefix, with_attrs, Some(checkpoint), |record| {
        into.insert(record.name.clone(), record);
        Ok(())
    })
}

fn list(
    store: &RemoteStore,
    bucket: &str,
    prefix: &str,
    with_attrs: bool,
    checkpoint: Option<&CheckpointMap>,
    mut emit: impl FnMut(EntryRecord) -> Result<()>,
) -> Result<()> {
    let mut token: Option<String> = None;
    loop {
        let page = match store.list_page(bucket, prefix, token.as_deref()) {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(bucket, prefix, %err, "listing failed, ending scan");
                return Ok(());
            }
        };
        for object in &page.objects {
            let name = object.key.strip_prefix(prefix).unwrap_or(&object.key);
            if skip_name(name) {
                continue;
            }
            if let Some(map) = checkpoint {
                if map.get(name).map(|r| r.status) == Some(EntryStatus::CheckPass) {
                    tracing::debug!(name, "already check-pass, skipping");
                    continue;
                }
            }
            let record = if with_attrs {
                head_entry(store, bucket, &object.key, name)
            } else {
                listed_entry(name, object.size, object.modified)
            };
            if record.status == EntryStatus::NotFound {
                continue;
            }
            emit(record)?;
        }
        match page.next {
            Some(next) => token = Some(next),
            None => return Ok(()),
        }
    }
}
