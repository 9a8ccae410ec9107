//! Filesystem-to-object-store executors
//!
//! Attribute metadata rides along on the object itself: records carrying
//! stored metadata upload the six-field map, records without it upload none,
//! so a later scan of the destination sees exactly what the source knew.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use aws_sdk_s3::types::StorageClass;

use crate::error::{IoResultExt, Result};
use crate::location::join_entry;
use crate::meta::object::encode_attrs;
use crate::meta::EntryRecord;
use crate::storage::RemoteStore;

/// Upload one directory marker: a bodyless object keyed with the trailing
/// slash. Markers never carry a storage class.
pub fn copy_dir(
    store: &RemoteStore,
    record: &EntryRecord,
    bucket: &str,
    prefix: &str,
) -> Result<()> {
    let key = format!("{prefix}{}", record.name);
    store.put_marker(bucket, &key, metadata_for(record))?;
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Upload one regular file.
pub fn copy_file(
    store: &RemoteStore,
    record: &EntryRecord,
    src_root: &str,
    bucket: &str,
    prefix: &str,
    storage_class: &StorageClass,
) -> Result<()> {
    let src = join_entry(src_root, &record.name);
    let key = format!("{prefix}{}", record.name);
    store.put_file(
        bucket,
        &key,
        Path::new(&src),
        Some(storage_class.clone()),
        metadata_for(record),
    )?;
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Upload one symbolic link as an object whose body is the target string.
pub fn copy_symlink(
    store: &RemoteStore,
    record: &EntryRecord,
    src_root: &str,
    bucket: &str,
    prefix: &str,
    storage_class: &StorageClass,
) -> Result<()> {
    let src = join_entry(src_root, &record.name);
    let target = fs::read_link(&src).with_path(&src)?;
    let key = format!("{prefix}{}", record.name);
    store.put_bytes(
        bucket,
        &key,
        target.to_string_lossy().into_owned().into_bytes(),
        Some(storage_class.clone()),
        metadata_for(record),
    )?;
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

fn metadata_for(record: &EntryRecord) -> Option<HashMap<String, String>> {
    record.meta_present.then(|| encode_attrs(record))
}
