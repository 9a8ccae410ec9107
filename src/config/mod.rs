//! Configuration module
//!
//! CLI definition and the resolved run configuration.

mod settings;

pub use settings::{CheckMode, CheckScope, CliArgs, StorageClassArg, SyncConfig};
