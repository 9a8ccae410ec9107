//! Copy pipeline
//!
//! One producer enumerates the source into a bounded queue; a pool of
//! workers drains it and dispatches each record to the executor for the
//! run's mode and the record's kind. Verification then rebuilds both sides
//! and writes the checkpoint. Maps are only ever touched by a single thread;
//! workers communicate exclusively over channels.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::checkpoint;
use crate::config::{CheckMode, CheckScope, SyncConfig};
use crate::engine::session::{SyncSession, QUEUE_CAPACITY};
use crate::error::{Result, SyncError};
use crate::location::Location;
use crate::meta::{EntryKind, EntryRecord};
use crate::scan;
use crate::storage::{RemoteStore, StoreContext};
use crate::transfer::{download, local, remote, upload};
use crate::verify::{self, attrcheck, hashcheck, CheckSummary};

/// Outcome of one run, printed at exit.
#[derive(Debug)]
pub struct RunSummary {
    /// Run start, wall clock.
    pub started: DateTime<Local>,
    /// Run completion, wall clock.
    pub finished: DateTime<Local>,
    /// Copy-phase duration.
    pub copy_duration: Duration,
    /// Check-phase duration, when a check ran.
    pub check_duration: Option<Duration>,
    /// Entries copied successfully.
    pub entries_copied: u64,
    /// Entries whose transfer failed.
    pub entries_failed: u64,
    /// Regular-file bytes moved.
    pub bytes_copied: u64,
    /// Verification tally, when a check ran.
    pub check: Option<CheckSummary>,
}

impl RunSummary {
    /// Whether the run completed without transfer or verification failures.
    pub fn is_success(&self) -> bool {
        self.entries_failed == 0 && self.check.as_ref().map_or(true, |c| c.failed == 0)
    }

    /// Print the summary to the console.
    pub fn print(&self) {
        println!("\n=== Sync Summary ===");
        println!("Started:         {}", self.started.format("%Y-%m-%d %H:%M:%S"));
        println!("Finished:        {}", self.finished.format("%Y-%m-%d %H:%M:%S"));
        println!("Copy phase:      {:.2?}", self.copy_duration);
        if let Some(duration) = self.check_duration {
            println!("Check phase:     {:.2?}", duration);
        }
        println!("Entries copied:  {}", self.entries_copied);
        println!(
            "Bytes copied:    {}",
            humansize::format_size(self.bytes_copied, humansize::BINARY)
        );
        if self.entries_failed > 0 {
            println!("Entries failed:  {}", self.entries_failed);
        }
        if let Some(check) = &self.check {
            println!("\nCheck: {} passed, {} failed", check.passed, check.failed);
            for name in &check.failed_names {
                println!("  FAIL {name}");
            }
        }
    }
}

/// The copy-and-verify engine.
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    /// Build an engine over a resolved configuration.
    pub fn new(config: SyncConfig) -> SyncEngine {
        SyncEngine { config }
    }

    /// Execute one full run: copy phase, optional check phase, checkpoint
    /// write. Fatal errors abort; per-entry failures are counted.
    pub fn execute(&self) -> Result<RunSummary> {
        let started = Local::now();
        let copy_start = Instant::now();

        let session = SyncSession::open(&self.config)?;

        // Runtime and SDK config exist only when a side is an object store.
        // Keeping the runtime alive here keeps every Handle valid.
        let runtime = if session.mode.needs_remote() {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| SyncError::Runtime(e.to_string()))?;
            Some(rt)
        } else {
            None
        };
        let store_context = runtime.as_ref().map(|rt| {
            StoreContext::load(
                rt.handle().clone(),
                self.config.region.clone(),
                self.config.part_size,
            )
        });

        self.copy_phase(&session, store_context.as_ref())?;
        let copy_duration = copy_start.elapsed();

        let (check, check_duration) = if self.config.check == CheckMode::None {
            (None, None)
        } else {
            let check_start = Instant::now();
            let summary = self.check_phase(&session, store_context.as_ref())?;
            (Some(summary), Some(check_start.elapsed()))
        };

        Ok(RunSummary {
            started,
            finished: Local::now(),
            copy_duration,
            check_duration,
            entries_copied: session.stats.entries_copied.load(Ordering::Relaxed),
            entries_failed: session.stats.entries_failed.load(Ordering::Relaxed),
            bytes_copied: session.stats.bytes_copied.load(Ordering::Relaxed),
            check,
        })
    }

    fn copy_phase(&self, session: &SyncSession, context: Option<&StoreContext>) -> Result<()> {
        let (work_tx, work_rx) = bounded::<EntryRecord>(QUEUE_CAPACITY);
        std::thread::scope(|scope| {
            let producer = scope.spawn(move || self.produce(session, context, work_tx));
            for _ in 0..self.config.workers() {
                let work_rx = work_rx.clone();
                scope.spawn(move || self.consume(session, context, work_rx));
            }
            drop(work_rx);
            producer
                .join()
                .map_err(|_| SyncError::Runtime("producer thread panicked".to_string()))?
        })
    }

    /// Enumerate the source into the queue. Dropping the sender at return
    /// closes the queue; the pool drains whatever was emitted.
    fn produce(
        &self,
        session: &SyncSession,
        context: Option<&StoreContext>,
        queue: Sender<EntryRecord>,
    ) -> Result<()> {
        match &self.config.source {
            Location::Path(root) => scan::fs::produce(
                root,
                self.config.with_attrs,
                self.config.initial,
                &session.checkpoint,
                &queue,
            ),
            Location::Store { bucket, prefix } => {
                let store = RemoteStore::connect(need_context(context)?);
                scan::object::produce(
                    &store,
                    bucket,
                    prefix,
                    self.config.with_attrs,
                    self.config.initial,
                    &session.checkpoint,
                    &queue,
                )
            }
        }
    }

    fn consume(
        &self,
        session: &SyncSession,
        context: Option<&StoreContext>,
        queue: Receiver<EntryRecord>,
    ) {
        // one client per worker, so requests ride independent connections
        let store = context.map(RemoteStore::connect);
        while let Ok(record) = queue.recv() {
            match self.dispatch(&record, store.as_ref()) {
                Ok(()) => {
                    session.stats.entries_copied.fetch_add(1, Ordering::Relaxed);
                    if record.kind == EntryKind::File {
                        session
                            .stats
                            .bytes_copied
                            .fetch_add(record.size, Ordering::Relaxed);
                    }
                }
                Err(err) => {
                    tracing::error!(name = %record.name, %err, "copy failed");
                    session.stats.entries_failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    fn dispatch(&self, record: &EntryRecord, store: Option<&RemoteStore>) -> Result<()> {
        let config = &self.config;
        match (&config.source, &config.dest) {
            (Location::Path(src), Location::Path(dst)) => match record.kind {
                EntryKind::Directory => local::copy_dir(record, dst, &config.defaults),
                EntryKind::File => local::copy_file(record, src, dst, &config.defaults),
                EntryKind::Symlink => local::copy_symlink(record, src, dst),
            },
            (Location::Path(src), Location::Store { bucket, prefix }) => {
                let store = need_store(store)?;
                match record.kind {
                    EntryKind::Directory => upload::copy_dir(store, record, bucket, prefix),
                    EntryKind::File => upload::copy_file(
                        store,
                        record,
                        src,
                        bucket,
                        prefix,
                        &config.storage_class,
                    ),
                    EntryKind::Symlink => upload::copy_symlink(
                        store,
                        record,
                        src,
                        bucket,
                        prefix,
                        &config.storage_class,
                    ),
                }
            }
            (Location::Store { bucket, prefix }, Location::Path(dst)) => {
                let store = need_store(store)?;
                match record.kind {
                    EntryKind::Directory => download::copy_dir(record, dst, &config.defaults),
                    EntryKind::File => download::copy_file(
                        store,
                        record,
                        bucket,
                        prefix,
                        dst,
                        &config.defaults,
                    ),
                    EntryKind::Symlink => {
                        download::copy_symlink(store, record, bucket, prefix, dst)
                    }
                }
            }
            (
                Location::Store {
                    bucket: src_bucket,
                    prefix: src_prefix,
                },
                Location::Store {
                    bucket: dst_bucket,
                    prefix: dst_prefix,
                },
            ) => {
                let store = need_store(store)?;
                remote::copy_entry(
                    store,
                    record,
                    src_bucket,
                    src_prefix,
                    dst_bucket,
                    dst_prefix,
                    &config.storage_class,
                )
            }
        }
    }

    /// Rebuild both sides, compare, optionally re-hash, and persist the
    /// checkpoint. Incremental scope overlays results onto the prior map;
    /// full scope replaces it.
    fn check_phase(
        &self,
        session: &SyncSession,
        context: Option<&StoreContext>,
    ) -> Result<CheckSummary> {
        let incremental = self.config.check_scope == CheckScope::Incr && !self.config.initial;
        let (src_map, dst_map) = attrcheck::build_maps(
            &self.config.source,
            &self.config.dest,
            self.config.with_attrs,
            incremental,
            &session.checkpoint,
            context,
        )?;
        let mut results = attrcheck::compare(&src_map, &dst_map);
        if self.config.check == CheckMode::Hash {
            hashcheck::recheck(
                &self.config.source,
                &self.config.dest,
                &mut results,
                context,
                self.config.workers(),
            )?;
        }
        if incremental {
            checkpoint::save_merged(&session.checkpoint_path, &session.checkpoint, &results)?;
        } else {
            checkpoint::save(&session.checkpoint_path, &results)?;
        }
        Ok(verify::summarize(&results))
    }
}

fn need_store<'a>(store: Option<&'a RemoteStore>) -> Result<&'a RemoteStore> {
    store.ok_or_else(|| SyncError::Runtime("object store client missing".to_string()))
}

fn need_context<'a>(context: Option<&'a StoreContext>) -> Result<&'a StoreContext> {
    context.ok_or_else(|| SyncError::Runtime("object store context missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::EntryStatus;
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn build_tree(root: &Path) {
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), b"alpha").unwrap();
        std::fs::write(root.join("sub/b.bin"), b"beta beta").unwrap();
        std::os::unix::fs::symlink("a.txt", root.join("link")).unwrap();
    }

    fn config_for(src: &TempDir, dst: &TempDir) -> SyncConfig {
        let mut config = SyncConfig::local_test(
            &src.path().display().to_string(),
            &dst.path().display().to_string(),
        );
        config.check = CheckMode::Attr;
        config.check_scope = CheckScope::Full;
        config.initial = true;
        config
    }

    #[test]
    fn test_local_run_copies_and_passes_check() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());

        let summary = SyncEngine::new(config_for(&src, &dst)).execute().unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.entries_copied, 4);
        assert_eq!(summary.entries_failed, 0);
        assert_eq!(summary.bytes_copied, 14);
        let check = summary.check.unwrap();
        assert_eq!(check.passed, 4);
        assert_eq!(check.failed, 0);

        assert_eq!(std::fs::read(dst.path().join("a.txt")).unwrap(), b"alpha");
        assert_eq!(
            std::fs::read(dst.path().join("sub/b.bin")).unwrap(),
            b"beta beta"
        );
        assert_eq!(
            std::fs::read_link(dst.path().join("link")).unwrap(),
            Path::new("a.txt")
        );
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());
        filetime::set_file_mtime(
            src.path().join("a.txt"),
            filetime::FileTime::from_unix_time(1_400_000_000, 0),
        )
        .unwrap();

        SyncEngine::new(config_for(&src, &dst)).execute().unwrap();
        assert_eq!(
            std::fs::metadata(dst.path().join("a.txt")).unwrap().mtime(),
            1_400_000_000
        );
    }

    #[test]
    fn test_second_incremental_run_copies_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());

        let first = SyncEngine::new(config_for(&src, &dst)).execute().unwrap();
        assert_eq!(first.entries_copied, 4);

        let mut config = config_for(&src, &dst);
        config.initial = false;
        config.check_scope = CheckScope::Incr;
        let second = SyncEngine::new(config).execute().unwrap();

        assert!(second.is_success());
        assert_eq!(second.entries_copied, 0);
        // nothing was rescanned, so the incremental check saw no entries
        let check = second.check.unwrap();
        assert_eq!(check.passed + check.failed, 0);
    }

    #[test]
    fn test_hash_check_detects_same_size_corruption() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());

        SyncEngine::new(config_for(&src, &dst)).execute().unwrap();

        // same size, different bytes; attr policy still passes
        std::fs::write(dst.path().join("sub/b.bin"), b"beta bEta").unwrap();

        let mut config = config_for(&src, &dst);
        config.initial = false;
        config.check = CheckMode::Hash;
        let summary = SyncEngine::new(config).execute().unwrap();

        // entries were already check-pass, so no re-copy happened
        assert_eq!(summary.entries_copied, 0);
        let check = summary.check.unwrap();
        assert_eq!(check.failed, 1);
        assert_eq!(check.failed_names, vec!["sub/b.bin"]);
        assert_eq!(check.passed + check.failed, 4);
    }

    #[test]
    fn test_checkpoint_records_outcomes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());

        let config = config_for(&src, &dst);
        SyncEngine::new(config.clone()).execute().unwrap();

        let path = checkpoint::job_path(&config.source, &config.dest);
        let saved = checkpoint::load(&path);
        assert_eq!(saved.len(), 4);
        assert!(saved
            .values()
            .all(|r| r.status == EntryStatus::CheckPass));
        checkpoint::remove(&path).unwrap();
    }

    #[test]
    fn test_check_none_writes_no_checkpoint() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        build_tree(src.path());

        let mut config = config_for(&src, &dst);
        config.check = CheckMode::None;
        let summary = SyncEngine::new(config.clone()).execute().unwrap();

        assert!(summary.check.is_none());
        assert!(!checkpoint::job_path(&config.source, &config.dest).exists());
    }
}
