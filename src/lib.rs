//! # AttrSync - attribute-preserving directory and object-store sync
//!
//! AttrSync synchronizes a directory tree or an S3 prefix with another such
//! location, carrying Unix owner/group/permission/timestamp metadata across
//! the filesystem/object-store boundary, and verifies the result by
//! attributes or content hash.
//!
//! ## Design
//!
//! - **One record shape for both backends**: filesystem stat results and
//!   object metadata normalize into the same [`meta::EntryRecord`], so the
//!   rest of the pipeline never branches on where an entry came from.
//! - **Four copy modes**: filesystem and object store on either side, with
//!   an executor per (mode, entry kind) combination under [`transfer`].
//! - **Checkpointed runs**: per-entry verification outcomes persist between
//!   runs; incremental runs skip entries that already passed, making
//!   re-runs after partial failure cheap and idempotent.
//! - **Bounded worker pool**: one producer enumerates the source into a
//!   bounded queue; workers drain it, each with its own S3 client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use attrsync::config::{CheckMode, CliArgs, SyncConfig};
//! use attrsync::engine::SyncEngine;
//! use clap::Parser;
//!
//! let args = CliArgs::parse_from(["attrsync", "/data/src", "/data/dst", "-a", "-c", "attr"]);
//! let config = SyncConfig::from_cli(&args).unwrap();
//!
//! let summary = SyncEngine::new(config).execute().unwrap();
//! summary.print();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod location;
pub mod meta;
pub mod scan;
pub mod scratch;
pub mod storage;
pub mod transfer;
pub mod verify;

// Re-export commonly used types
pub use config::{CheckMode, CheckScope, SyncConfig};
pub use engine::{RunSummary, SyncEngine};
pub use error::{Result, SyncError};
pub use location::{Location, SyncMode};
pub use meta::{EntryKind, EntryRecord, EntryStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
