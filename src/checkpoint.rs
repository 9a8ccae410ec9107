//! Checkpoint store
//!
//! One JSON file per source/destination pair records the verification outcome
//! of every entry seen so far. Incremental runs consult it to skip entries
//! that already passed verification; the file is rewritten at the end of each
//! checked run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result, SyncError};
use crate::location::Location;
use crate::meta::EntryRecord;

/// Schema version written into every checkpoint file.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Map from relative entry name to its last recorded state.
pub type CheckpointMap = HashMap<String, EntryRecord>;

#[derive(Serialize)]
struct CheckpointWriter<'a> {
    version: u32,
    entries: &'a CheckpointMap,
}

#[derive(Deserialize)]
struct CheckpointReader {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    entries: CheckpointMap,
}

/// Directory holding all checkpoint files.
pub fn jobs_dir() -> PathBuf {
    std::env::temp_dir().join("attrsync-jobs")
}

/// Checkpoint path for a source/destination pair: both normalized addresses
/// with their separators stripped, so each pair maps to one stable file.
pub fn job_path(source: &Location, dest: &Location) -> PathBuf {
    let src = source.to_string().replace('/', "");
    let dst = dest.to_string().replace('/', "");
    jobs_dir().join(format!("_{src}_{dst}"))
}

/// Load a checkpoint map.
///
/// A missing file means a first run; corrupt content or an unknown schema
/// version is logged and treated the same way. Never fatal.
pub fn load(path: &Path) -> CheckpointMap {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %err, "checkpoint unreadable, starting empty");
            }
            return CheckpointMap::new();
        }
    };
    match serde_json::from_slice::<CheckpointReader>(&data) {
        Ok(file) if file.version == CHECKPOINT_VERSION => file.entries,
        Ok(file) => {
            tracing::warn!(
                path = %path.display(),
                version = file.version,
                "checkpoint schema version mismatch, starting empty"
            );
            CheckpointMap::new()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "checkpoint corrupt, starting empty");
            CheckpointMap::new()
        }
    }
}

/// Rewrite the checkpoint file with the given map.
pub fn save(path: &Path, entries: &CheckpointMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    let json = serde_json::to_string_pretty(&CheckpointWriter {
        version: CHECKPOINT_VERSION,
        entries,
    })?;
    // append rather than with_extension: job file names can contain dots,
    // and truncating at the last one could collide two jobs' staging files
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    fs::write(&temp_path, json).with_path(&temp_path)?;
    fs::rename(&temp_path, path).with_path(path)?;
    Ok(())
}

/// Overlay `results` onto `base` by entry name, then rewrite the file.
/// Base entries without a new result survive unchanged.
pub fn save_merged(path: &Path, base: &CheckpointMap, results: &CheckpointMap) -> Result<()> {
    let mut merged = base.clone();
    for (name, record) in results {
        merged.insert(name.clone(), record.clone());
    }
    save(path, &merged)
}

/// Delete the checkpoint ahead of a forced initial run.
pub fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SyncError::io(path, err)),
    }
}
