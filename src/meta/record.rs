//! Entry records shared by both backends and every pipeline phase

use serde::{Deserialize, Serialize};

/// Entry type, derived once at scan time and never recomputed.
///
/// Serialized as the four-digit type code carried in object metadata and the
/// checkpoint file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryKind {
    /// Directory, type code `0040`.
    #[serde(rename = "0040")]
    Directory,
    /// Symbolic link, type code `0120`.
    #[serde(rename = "0120")]
    Symlink,
    /// Regular file, type code `0100`.
    #[default]
    #[serde(rename = "0100")]
    File,
}

impl EntryKind {
    /// The four-digit type code for this kind.
    pub fn type_code(&self) -> &'static str {
        match self {
            EntryKind::Directory => "0040",
            EntryKind::Symlink => "0120",
            EntryKind::File => "0100",
        }
    }

    /// Parse a four-digit type code.
    pub fn from_type_code(code: &str) -> Option<EntryKind> {
        match code {
            "0040" => Some(EntryKind::Directory),
            "0120" => Some(EntryKind::Symlink),
            "0100" => Some(EntryKind::File),
            _ => None,
        }
    }

    /// Classify a filesystem entry. Types outside the three supported kinds
    /// (sockets, FIFOs, devices) have no code and return `None`.
    pub fn from_file_type(file_type: std::fs::FileType) -> Option<EntryKind> {
        if file_type.is_dir() {
            Some(EntryKind::Directory)
        } else if file_type.is_symlink() {
            Some(EntryKind::Symlink)
        } else if file_type.is_file() {
            Some(EntryKind::File)
        } else {
            None
        }
    }
}

/// Per-entry lifecycle status. Transitions only move forward within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    /// Lookup failed or the entry has not been seen yet.
    #[default]
    NotFound,
    /// Normalized and queued for transfer or verification.
    InCopy,
    /// Verification passed.
    CheckPass,
    /// Verification failed.
    CheckFail,
}

/// Normalized view of one entry, identical for both backends.
///
/// `name` is the path relative to the scan root; directories carry exactly
/// one trailing `/`. Times are Unix seconds. Unknown fields from older
/// checkpoint files default to zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryRecord {
    pub name: String,
    pub meta_present: bool,
    pub uid: u32,
    pub gid: u32,
    pub kind: EntryKind,
    pub perm: String,
    pub atime: i64,
    pub mtime: i64,
    pub size: u64,
    pub status: EntryStatus,
    pub status_time: i64,
}

impl EntryRecord {
    /// Marker record for a failed lookup. Consumers skip these.
    pub fn not_found(name: impl Into<String>) -> Self {
        EntryRecord {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Fallback attributes applied when a destination entry has no stored
/// metadata to restore.
#[derive(Debug, Clone)]
pub struct DefaultAttrs {
    pub uid: u32,
    pub gid: u32,
    /// Octal permission string, e.g. `"775"`.
    pub mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_round_trip() {
        for kind in [EntryKind::Directory, EntryKind::Symlink, EntryKind::File] {
            assert_eq!(EntryKind::from_type_code(kind.type_code()), Some(kind));
        }
        assert_eq!(EntryKind::from_type_code("0140"), None);
        assert_eq!(EntryKind::from_type_code(""), None);
    }

    #[test]
    fn test_record_serde_defaults() {
        let record: EntryRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.status, EntryStatus::NotFound);
        assert_eq!(record.kind, EntryKind::File);
        assert_eq!(record.size, 0);
        assert!(!record.meta_present);
    }

    #[test]
    fn test_kind_serializes_as_type_code() {
        let json = serde_json::to_string(&EntryKind::Directory).unwrap();
        assert_eq!(json, "\"0040\"");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&EntryStatus::CheckPass).unwrap();
        assert_eq!(json, "\"check-pass\"");
    }

    #[test]
    fn test_not_found_marker() {
        let record = EntryRecord::not_found("a/b.txt");
        assert_eq!(record.status, EntryStatus::NotFound);
        assert_eq!(record.name, "a/b.txt");
    }
}
