//! Object-store-to-filesystem executors

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::location::join_entry;
use crate::meta::{DefaultAttrs, EntryRecord};
use crate::storage::RemoteStore;
use crate::transfer::{attrs, ensure_parent, replace_symlink};

/// Materialize one directory from its marker and restore its attributes.
/// No store round trip is needed; the record already carries everything.
pub fn copy_dir(record: &EntryRecord, dst_root: &str, defaults: &DefaultAttrs) -> Result<()> {
    let dst = join_entry(dst_root, &record.name);
    fs::create_dir_all(&dst).with_path(&dst)?;
    attrs::apply(record, Path::new(&dst), defaults, false);
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Download one regular file and restore its attributes including
/// timestamps.
pub fn copy_file(
    store: &RemoteStore,
    record: &EntryRecord,
    bucket: &str,
    prefix: &str,
    dst_root: &str,
    defaults: &DefaultAttrs,
) -> Result<()> {
    let key = format!("{prefix}{}", record.name);
    let dst = join_entry(dst_root, &record.name);
    ensure_parent(&dst)?;
    store.get_to_file(bucket, &key, Path::new(&dst), record.size)?;
    attrs::apply(record, Path::new(&dst), defaults, true);
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Recreate one symbolic link from an object whose body is the target
/// string, replacing whatever the destination currently holds.
pub fn copy_symlink(
    store: &RemoteStore,
    record: &EntryRecord,
    bucket: &str,
    prefix: &str,
    dst_root: &str,
) -> Result<()> {
    let key = format!("{prefix}{}", record.name);
    let dst = join_entry(dst_root, &record.name);
    ensure_parent(&dst)?;
    let body = store.get_to_vec(bucket, &key)?;
    let target = String::from_utf8_lossy(&body).into_owned();
    replace_symlink(Path::new(&target), Path::new(&dst))?;
    tracing::info!(name = %record.name, "copy");
    Ok(())
}
