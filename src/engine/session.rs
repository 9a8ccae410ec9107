//! Per-run state
//!
//! One session is built per run and never shared across runs. It carries the
//! resolved mode, the checkpoint loaded at start, and the counters the
//! workers feed.

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;

use crate::checkpoint::{self, CheckpointMap};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::location::SyncMode;

/// Work queue capacity. Sized to hold the producer's whole backlog so a
/// slow-starting pool can never deadlock the producer.
pub const QUEUE_CAPACITY: usize = 100_000;

/// Copy-phase counters, written by the workers and read once for the
/// summary.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Entries copied successfully.
    pub entries_copied: AtomicU64,
    /// Entries whose transfer failed; they stay unverified in the checkpoint
    /// and are retried by the next incremental run.
    pub entries_failed: AtomicU64,
    /// Regular-file bytes moved.
    pub bytes_copied: AtomicU64,
}

/// State owned by one orchestration run.
pub struct SyncSession {
    /// Copy mode resolved from the address pair.
    pub mode: SyncMode,
    /// Checkpoint file for this source/destination pair.
    pub checkpoint_path: PathBuf,
    /// Checkpoint map loaded at run start; empty on a forced initial run.
    pub checkpoint: CheckpointMap,
    /// Copy-phase counters.
    pub stats: RunStats,
}

impl SyncSession {
    /// Resolve the mode and load the checkpoint. A forced initial run
    /// deletes the prior checkpoint first.
    pub fn open(config: &SyncConfig) -> Result<SyncSession> {
        let mode = SyncMode::resolve(&config.source, &config.dest);
        let checkpoint_path = checkpoint::job_path(&config.source, &config.dest);
        if config.initial {
            checkpoint::remove(&checkpoint_path)?;
        }
        let checkpoint = checkpoint::load(&checkpoint_path);
        tracing::debug!(
            ?mode,
            checkpoint = %checkpoint_path.display(),
            prior_entries = checkpoint.len(),
            "session opened"
        );
        Ok(SyncSession {
            mode,
            checkpoint_path,
            checkpoint,
            stats: RunStats::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EntryRecord, EntryStatus};
    use tempfile::TempDir;

    fn config_for(src: &TempDir, dst: &TempDir, initial: bool) -> SyncConfig {
        let mut config = SyncConfig::local_test(
            &src.path().display().to_string(),
            &dst.path().display().to_string(),
        );
        config.initial = initial;
        config
    }

    #[test]
    fn test_open_resolves_mode_and_loads_checkpoint() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let config = config_for(&src, &dst, false);

        let mut prior = CheckpointMap::new();
        prior.insert(
            "a.txt".into(),
            EntryRecord {
                name: "a.txt".into(),
                status: EntryStatus::CheckPass,
                ..Default::default()
            },
        );
        let path = checkpoint::job_path(&config.source, &config.dest);
        checkpoint::save(&path, &prior).unwrap();

        let session = SyncSession::open(&config).unwrap();
        assert_eq!(session.mode, SyncMode::LocalToLocal);
        assert_eq!(session.checkpoint.len(), 1);
        checkpoint::remove(&path).unwrap();
    }

    #[test]
    fn test_initial_run_discards_prior_checkpoint() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let config = config_for(&src, &dst, true);

        let path = checkpoint::job_path(&config.source, &config.dest);
        let mut prior = CheckpointMap::new();
        prior.insert("stale".into(), EntryRecord::not_found("stale"));
        checkpoint::save(&path, &prior).unwrap();

        let session = SyncSession::open(&config).unwrap();
        assert!(session.checkpoint.is_empty());
        assert!(!path.exists());
    }
}
