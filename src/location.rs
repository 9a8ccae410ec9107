//! Source and destination addressing
//!
//! An address is either a filesystem path or an object-store location of the
//! form `s3://bucket[/prefix]`. The pair of addresses for a run determines
//! which of the four copy modes executes.

use std::fmt;

use crate::error::{Result, SyncError};

/// A parsed copy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local directory root, stored with exactly one trailing `/`.
    Path(String),
    /// Object-store location. `prefix` is empty or ends with `/`.
    Store { bucket: String, prefix: String },
}

impl Location {
    /// Parse a raw address.
    ///
    /// Anything starting with `s3://` (scheme match is case-insensitive) is an
    /// object-store location: the bucket runs to the first `/`, the remainder
    /// becomes the prefix with a trailing `/` appended. Everything else is
    /// treated as a filesystem path and normalized to carry a trailing `/`.
    pub fn parse(raw: &str) -> Result<Location> {
        if raw.is_empty() {
            return Err(SyncError::InvalidLocation("empty address".into()));
        }
        if raw.len() >= 5 && raw[..5].eq_ignore_ascii_case("s3://") {
            let rest = raw[5..].trim_matches('/');
            if rest.is_empty() {
                return Err(SyncError::InvalidLocation(format!(
                    "missing bucket in '{raw}'"
                )));
            }
            let (bucket, prefix) = match rest.find('/') {
                Some(idx) => (rest[..idx].to_string(), format!("{}/", &rest[idx + 1..])),
                None => (rest.to_string(), String::new()),
            };
            return Ok(Location::Store { bucket, prefix });
        }
        let mut path = raw.to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        Ok(Location::Path(path))
    }

    /// Whether this endpoint is an object store.
    pub fn is_store(&self) -> bool {
        matches!(self, Location::Store { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => f.write_str(p),
            Location::Store { bucket, prefix } => write!(f, "s3://{bucket}/{prefix}"),
        }
    }
}

/// The four copy modes, resolved once from the address pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Filesystem to filesystem.
    LocalToLocal,
    /// Filesystem to object store.
    LocalToStore,
    /// Object store to filesystem.
    StoreToLocal,
    /// Object store to object store.
    StoreToStore,
}

impl SyncMode {
    /// Resolve the mode for a source/destination pair.
    pub fn resolve(source: &Location, dest: &Location) -> SyncMode {
        match (source.is_store(), dest.is_store()) {
            (false, false) => SyncMode::LocalToLocal,
            (false, true) => SyncMode::LocalToStore,
            (true, false) => SyncMode::StoreToLocal,
            (true, true) => SyncMode::StoreToStore,
        }
    }

    /// Whether either side needs an object-store client.
    pub fn needs_remote(&self) -> bool {
        !matches!(self, SyncMode::LocalToLocal)
    }
}

/// Join a relative entry name onto a filesystem root.
///
/// Directory names keep their trailing `/` in the result; the root entry
/// (`.`) maps to the root itself with a trailing `/`.
pub fn join_entry(root: &str, name: &str) -> String {
    if name == "." {
        return if root.ends_with('/') {
            root.to_string()
        } else {
            format!("{root}/")
        };
    }
    let base = root.trim_end_matches('/');
    let rel = name.trim_start_matches('/');
    if name.ends_with('/') {
        format!("{}/{}/", base, rel.trim_end_matches('/'))
    } else {
        format!("{base}/{rel}")
    }
}
