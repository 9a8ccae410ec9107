//! Verification module
//!
//! After the copy phase, source and destination are re-enumerated into maps
//! and compared: first by attributes, then optionally by content hash. The
//! outcome of each entry is a status, never an error.

pub mod attrcheck;
pub mod hashcheck;

use crate::checkpoint::CheckpointMap;
use crate::meta::EntryStatus;

/// Tally of a verification pass.
#[derive(Debug, Default)]
pub struct CheckSummary {
    pub passed: usize,
    pub failed: usize,
    /// Names of failing entries, sorted for stable output.
    pub failed_names: Vec<String>,
}

/// Count pass/fail outcomes in a result map.
pub fn summarize(results: &CheckpointMap) -> CheckSummary {
    let mut failed_names: Vec<String> = results
        .values()
        .filter(|r| r.status == EntryStatus::CheckFail)
        .map(|r| r.name.clone())
        .collect();
    failed_names.sort();
    CheckSummary {
        passed: results
            .values()
            .filter(|r| r.status == EntryStatus::CheckPass)
            .count(),
        failed: failed_names.len(),
        failed_names,
    }
}

pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
