//! Object-store metadata normalization
//!
//! Unix attributes survive the trip through the object store as six
//! user-metadata fields, all encoded as decimal strings:
//! `user-agent`, `file-owner`, `file-group`, `file-permissions` (four-digit
//! type code followed by the octal permission digits), `file-atime`, and
//! `file-mtime`. An object carrying exactly these six decodable fields is
//! attribute-complete; anything else falls back to attribute-absent defaults.

use std::collections::HashMap;

use crate::meta::record::{EntryKind, EntryRecord, EntryStatus};
use crate::storage::{HeadOutput, RemoteStore};

/// Tag written into the `user-agent` metadata field of every upload.
pub const TOOL_TAG: &str = "attrsync";

/// Attributes decoded from a stored metadata map.
#[derive(Debug, PartialEq)]
pub struct DecodedAttrs {
    pub uid: u32,
    pub gid: u32,
    pub kind: EntryKind,
    pub perm: String,
    pub atime: i64,
    pub mtime: i64,
}

/// Encode a record's attributes into the six-field metadata map.
pub fn encode_attrs(record: &EntryRecord) -> HashMap<String, String> {
    HashMap::from([
        ("user-agent".to_string(), TOOL_TAG.to_string()),
        ("file-owner".to_string(), record.uid.to_string()),
        ("file-group".to_string(), record.gid.to_string()),
        (
            "file-permissions".to_string(),
            format!("{}{}", record.kind.type_code(), record.perm),
        ),
        ("file-atime".to_string(), record.atime.to_string()),
        ("file-mtime".to_string(), record.mtime.to_string()),
    ])
}

/// Decode a stored metadata map. Any missing, extra, or malformed field
/// makes the object attribute-absent.
pub fn decode_attrs(metadata: &HashMap<String, String>) -> Option<DecodedAttrs> {
    if metadata.len() != 6 {
        return None;
    }
    metadata.get("user-agent")?;
    let uid = metadata.get("file-owner")?.parse().ok()?;
    let gid = metadata.get("file-group")?.parse().ok()?;
    let perms = metadata.get("file-permissions")?;
    // get() rather than byte slicing: a foreign value can put a multibyte
    // character across the split point
    let kind = EntryKind::from_type_code(perms.get(..4)?)?;
    let perm = perms.get(4..)?;
    u32::from_str_radix(perm, 8).ok()?;
    let atime = metadata.get("file-atime")?.parse().ok()?;
    let mtime = metadata.get("file-mtime")?.parse().ok()?;
    Some(DecodedAttrs {
        uid,
        gid,
        kind,
        perm: perm.to_string(),
        atime,
        mtime,
    })
}

/// Normalize one object with full attributes via a point lookup.
///
/// Any lookup failure yields a not-found marker; the scan moves on.
pub fn head_entry(store: &RemoteStore, bucket: &str, key: &str, name: &str) -> EntryRecord {
    match store.head(bucket, key) {
        Ok(head) => from_head(name, &head),
        Err(err) => {
            tracing::warn!(key, %err, "head failed");
            EntryRecord::not_found(name)
        }
    }
}

/// Build a record from a HEAD response.
pub fn from_head(name: &str, head: &HeadOutput) -> EntryRecord {
    match decode_attrs(&head.metadata) {
        Some(attrs) => EntryRecord {
            name: name.to_string(),
            meta_present: true,
            uid: attrs.uid,
            gid: attrs.gid,
            kind: attrs.kind,
            perm: attrs.perm,
            atime: attrs.atime,
            mtime: attrs.mtime,
            size: head.size,
            status: EntryStatus::InCopy,
            status_time: 0,
        },
        None => EntryRecord {
            name: name.to_string(),
            meta_present: false,
            uid: 0,
            gid: 0,
            kind: kind_from_name(name),
            perm: "775".to_string(),
            atime: head.modified,
            mtime: head.modified,
            size: head.size,
            status: EntryStatus::InCopy,
            status_time: 0,
        },
    }
}

/// Build a record straight from a listing row, skipping the point lookup.
/// Used when attribute preservation is off.
pub fn listed_entry(name: &str, size: u64, modified: i64) -> EntryRecord {
    EntryRecord {
        name: name.to_string(),
        kind: kind_from_name(name),
        atime: modified,
        mtime: modified,
        size,
        status: EntryStatus::InCopy,
        ..Default::default()
    }
}

fn kind_from_name(name: &str) -> EntryKind {
    if name.ends_with('/') {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> EntryRecord {
        EntryRecord {
            name: "a/b.txt".into(),
            meta_present: true,
            uid: 1000,
            gid: 1000,
            kind: EntryKind::File,
            perm: "644".into(),
            atime: 1_700_000_000,
            mtime: 1_700_000_100,
            size: 42,
            status: EntryStatus::InCopy,
            status_time: 0,
        }
    }

    #[test]
    fn test_attrs_round_trip() {
        let record = full_record();
        let map = encode_attrs(&record);
        assert_eq!(map.len(), 6);
        assert_eq!(map["user-agent"], TOOL_TAG);
        assert_eq!(map["file-permissions"], "0100644");

        let decoded = decode_attrs(&map).unwrap();
        assert_eq!(decoded.uid, 1000);
        assert_eq!(decoded.kind, EntryKind::File);
        assert_eq!(decoded.perm, "644");
        assert_eq!(decoded.mtime, 1_700_000_100);
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        let mut map = encode_attrs(&full_record());
        map.remove("file-atime");
        assert!(decode_attrs(&map).is_none());

        let mut map = encode_attrs(&full_record());
        map.insert("extra".into(), "1".into());
        assert!(decode_attrs(&map).is_none());
    }

    #[test]
    fn test_decode_rejects_bare_type_code() {
        let mut map = encode_attrs(&full_record());
        map.insert("file-permissions".into(), "0040".into());
        assert!(decode_attrs(&map).is_none());
    }

    #[test]
    fn test_decode_rejects_multibyte_permissions() {
        // '€' straddles the type-code boundary; must decode as absent,
        // not panic
        let mut map = encode_attrs(&full_record());
        map.insert("file-permissions".into(), "00€0644".into());
        assert!(decode_attrs(&map).is_none());
    }

    #[test]
    fn test_decode_rejects_non_octal_permissions() {
        let mut map = encode_attrs(&full_record());
        map.insert("file-permissions".into(), "010099".into());
        assert!(decode_attrs(&map).is_none());
    }

    #[test]
    fn test_from_head_fallback_uses_name_suffix() {
        let head = HeadOutput {
            size: 0,
            modified: 1_700_000_000,
            metadata: HashMap::new(),
        };
        let record = from_head("dir1/", &head);
        assert_eq!(record.kind, EntryKind::Directory);
        assert!(!record.meta_present);
        assert_eq!(record.perm, "775");
        assert_eq!(record.mtime, 1_700_000_000);
        assert_eq!(record.atime, 1_700_000_000);
    }

    #[test]
    fn test_from_head_decodes_symlink_code() {
        let mut record = full_record();
        record.kind = EntryKind::Symlink;
        record.perm = "777".into();
        let head = HeadOutput {
            size: 9,
            modified: 1,
            metadata: encode_attrs(&record),
        };
        let rebuilt = from_head("link", &head);
        assert_eq!(rebuilt.kind, EntryKind::Symlink);
        assert!(rebuilt.meta_present);
        assert_eq!(rebuilt.size, 9);
    }

    #[test]
    fn test_listed_entry() {
        let record = listed_entry("sub/", 0, 5);
        assert_eq!(record.kind, EntryKind::Directory);
        assert!(!record.meta_present);

        let record = listed_entry("sub/f.bin", 10, 5);
        assert_eq!(record.kind, EntryKind::File);
        assert_eq!(record.size, 10);
    }
}
