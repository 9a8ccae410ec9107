//! Filesystem-to-filesystem executors

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::location::join_entry;
use crate::meta::{DefaultAttrs, EntryRecord};
use crate::transfer::{attrs, ensure_parent, replace_symlink};

/// Create one directory under the destination root and restore its
/// attributes. Directory timestamps are never restored; later file copies
/// into it would disturb them anyway.
pub fn copy_dir(record: &EntryRecord, dst_root: &str, defaults: &DefaultAttrs) -> Result<()> {
    let dst = join_entry(dst_root, &record.name);
    fs::create_dir_all(&dst).with_path(&dst)?;
    attrs::apply(record, Path::new(&dst), defaults, false);
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Copy one regular file and restore its attributes including timestamps.
pub fn copy_file(
    record: &EntryRecord,
    src_root: &str,
    dst_root: &str,
    defaults: &DefaultAttrs,
) -> Result<()> {
    let src = join_entry(src_root, &record.name);
    let dst = join_entry(dst_root, &record.name);
    ensure_parent(&dst)?;
    let mut reader = fs::File::open(&src).with_path(&src)?;
    let mut writer = fs::File::create(&dst).with_path(&dst)?;
    io::copy(&mut reader, &mut writer).with_path(&dst)?;
    attrs::apply(record, Path::new(&dst), defaults, true);
    tracing::info!(name = %record.name, "copy");
    Ok(())
}

/// Recreate one symbolic link, replacing whatever the destination currently
/// holds. Link attributes are never restored.
pub fn copy_symlink(record: &EntryRecord, src_root: &str, dst_root: &str) -> Result<()> {
    let src = join_entry(src_root, &record.name);
    let dst = join_entry(dst_root, &record.name);
    ensure_parent(&dst)?;
    let target = fs::read_link(&src).with_path(&src)?;
    replace_symlink(&target, Path::new(&dst))?;
    tracing::info!(name = %record.name, "copy");
    Ok(())
}
