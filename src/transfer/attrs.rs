//! Attribute restoration
//!
//! Applies ownership, permission bits, and optionally timestamps to a
//! destination entry after its content lands. Every failure here is a
//! warning: an unprivileged run cannot chown to foreign owners, and a copy
//! that lands without its attributes is still a copy.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use filetime::FileTime;
use nix::unistd::{chown, Gid, Uid};

use crate::meta::{DefaultAttrs, EntryRecord};

/// Restore attributes onto `path`.
///
/// Records without stored metadata fall back to the configured defaults for
/// ownership and mode; timestamps always come from the record. Directory
/// callers pass `with_times = false`.
pub fn apply(record: &EntryRecord, path: &Path, defaults: &DefaultAttrs, with_times: bool) {
    let (uid, gid, mode) = if record.meta_present {
        (record.uid, record.gid, record.perm.as_str())
    } else {
        (defaults.uid, defaults.gid, defaults.mode.as_str())
    };

    if let Err(err) = chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))) {
        tracing::warn!(path = %path.display(), uid, gid, %err, "chown failed");
    }

    match u32::from_str_radix(mode, 8) {
        Ok(bits) => {
            let perms = std::fs::Permissions::from_mode(bits);
            if let Err(err) = std::fs::set_permissions(path, perms) {
                tracing::warn!(path = %path.display(), mode, %err, "chmod failed");
            }
        }
        Err(_) => {
            tracing::warn!(path = %path.display(), mode, "invalid permission string");
        }
    }

    if with_times {
        let atime = FileTime::from_unix_time(record.atime, 0);
        let mtime = FileTime::from_unix_time(record.mtime, 0);
        if let Err(err) = filetime::set_file_times(path, atime, mtime) {
            tracing::warn!(path = %path.display(), %err, "restoring times failed");
        }
    }
}
