//! Configuration settings for AttrSync
//!
//! Defines the CLI surface and the resolved run configuration built from it.
//! All validation happens here; the engine receives a `SyncConfig` that is
//! already known good.

use aws_sdk_s3::types::StorageClass;
use clap::{Parser, ValueEnum};

use crate::error::{Result, SyncError};
use crate::location::Location;
use crate::meta::DefaultAttrs;

/// AttrSync - attribute-preserving directory and object-store synchronization
#[derive(Parser, Debug, Clone)]
#[command(name = "attrsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synchronize a directory tree or S3 prefix, preserving Unix attributes")]
#[command(long_about = r#"
AttrSync copies a directory tree or S3 prefix to another such location,
carrying Unix owner/group/permission/timestamp metadata across the
filesystem/object-store boundary, and verifies the result.

An address of the form s3://bucket[/prefix] is an object-store location;
anything else is a filesystem path. All four direction combinations work.

Runs are checkpointed per source/destination pair: entries that already
passed verification are skipped on the next run, so re-running after a
partial failure only retries what is left.

Examples:
  attrsync /data/src /data/dst -a -c attr          # local copy with attributes
  attrsync /data/src s3://backup/data -a -c hash   # upload and hash-verify
  attrsync s3://backup/data /restore -a            # download
  attrsync s3://a/x s3://b/x --storage-class glacier
"#)]
pub struct CliArgs {
    /// Source location (path or s3://bucket[/prefix])
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Destination location (path or s3://bucket[/prefix])
    #[arg(value_name = "DESTINATION")]
    pub dest: String,

    /// Worker count as a multiple of available CPUs
    #[arg(short = 'f', long, default_value = "10", value_name = "NUM")]
    pub factor: usize,

    /// Transfer part size in MB (multipart upload / ranged download)
    #[arg(short = 'p', long, default_value = "100", value_name = "MB")]
    pub part_size: u64,

    /// Storage class for uploaded objects
    #[arg(long, value_enum, default_value = "standard")]
    pub storage_class: StorageClassArg,

    /// Force a full initial run, discarding the prior checkpoint
    #[arg(short = 'i', long)]
    pub initial: bool,

    /// Preserve owner/group/permission/timestamp attributes
    #[arg(short = 'a', long)]
    pub attrs: bool,

    /// Post-copy check mode
    #[arg(short = 'c', long, value_enum, default_value = "none")]
    pub check: CheckMode,

    /// Check scope: incremental skips entries that already passed
    #[arg(short = 't', long, value_enum, default_value = "incr")]
    pub check_scope: CheckScope,

    /// Fallback owner uid for entries without stored metadata
    #[arg(short = 'u', long, value_name = "UID")]
    pub default_uid: Option<u32>,

    /// Fallback group gid for entries without stored metadata
    #[arg(short = 'g', long, value_name = "GID")]
    pub default_gid: Option<u32>,

    /// Fallback permission bits, octal
    #[arg(short = 'm', long, default_value = "775", value_name = "MODE")]
    pub default_mode: String,

    /// AWS region (falls back to the environment)
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,
}

/// Post-copy verification mode.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// No verification; no checkpoint is written.
    #[default]
    None,
    /// Attribute comparison (presence, size, modify time).
    Attr,
    /// Attribute comparison plus content-hash comparison.
    Hash,
}

/// How much of the tree a check rescans.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckScope {
    /// Skip entries the checkpoint already records as passed.
    #[default]
    Incr,
    /// Rescan both sides completely.
    Full,
}

/// S3 storage class, as a CLI enum.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageClassArg {
    /// S3 Standard.
    #[default]
    Standard,
    /// S3 Standard-Infrequent Access.
    #[value(name = "standard-ia")]
    StandardIa,
    /// S3 One Zone-Infrequent Access.
    #[value(name = "onezone-ia")]
    OnezoneIa,
    /// S3 Intelligent-Tiering.
    IntelligentTiering,
    /// S3 Glacier Flexible Retrieval.
    Glacier,
    /// S3 Glacier Instant Retrieval.
    #[value(name = "glacier-ir")]
    GlacierIr,
    /// S3 Glacier Deep Archive.
    DeepArchive,
    /// Reduced Redundancy (legacy).
    ReducedRedundancy,
}

impl StorageClassArg {
    /// The SDK storage class for this option.
    pub fn to_class(self) -> StorageClass {
        match self {
            StorageClassArg::Standard => StorageClass::Standard,
            StorageClassArg::StandardIa => StorageClass::StandardIa,
            StorageClassArg::OnezoneIa => StorageClass::OnezoneIa,
            StorageClassArg::IntelligentTiering => StorageClass::IntelligentTiering,
            StorageClassArg::Glacier => StorageClass::Glacier,
            StorageClassArg::GlacierIr => StorageClass::GlacierIr,
            StorageClassArg::DeepArchive => StorageClass::DeepArchive,
            StorageClassArg::ReducedRedundancy => StorageClass::ReducedRedundancy,
        }
    }
}

/// Resolved run configuration, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Parsed source location.
    pub source: Location,
    /// Parsed destination location.
    pub dest: Location,
    /// Worker count multiplier.
    pub factor: usize,
    /// Transfer part size in bytes.
    pub part_size: u64,
    /// Storage class applied to uploads and server-side copies.
    pub storage_class: StorageClass,
    /// Forced initial run.
    pub initial: bool,
    /// Attribute preservation requested.
    pub with_attrs: bool,
    /// Post-copy check mode.
    pub check: CheckMode,
    /// Check scope.
    pub check_scope: CheckScope,
    /// Fallback attributes for entries without stored metadata.
    pub defaults: DefaultAttrs,
    /// AWS region override.
    pub region: Option<String>,
}

impl SyncConfig {
    /// Validate CLI arguments into a run configuration.
    pub fn from_cli(args: &CliArgs) -> Result<SyncConfig> {
        let source = Location::parse(&args.source)?;
        let dest = Location::parse(&args.dest)?;
        if args.factor == 0 {
            return Err(SyncError::config("factor must be at least 1"));
        }
        if args.part_size == 0 {
            return Err(SyncError::config("part size must be at least 1 MB"));
        }
        match u32::from_str_radix(&args.default_mode, 8) {
            Ok(bits) if bits <= 0o777 => {}
            _ => {
                return Err(SyncError::config(format!(
                    "default mode '{}' is not a valid octal permission",
                    args.default_mode
                )))
            }
        }
        Ok(SyncConfig {
            source,
            dest,
            factor: args.factor,
            part_size: args.part_size * 1024 * 1024,
            storage_class: args.storage_class.to_class(),
            initial: args.initial,
            with_attrs: args.attrs,
            check: args.check,
            check_scope: args.check_scope,
            defaults: DefaultAttrs {
                uid: args
                    .default_uid
                    .unwrap_or_else(|| nix::unistd::getuid().as_raw()),
                gid: args
                    .default_gid
                    .unwrap_or_else(|| nix::unistd::getgid().as_raw()),
                mode: args.default_mode.clone(),
            },
            region: args.region.clone(),
        })
    }

    /// Worker pool size for this run.
    pub fn workers(&self) -> usize {
        self.factor * num_cpus::get()
    }

    /// Minimal local-to-local configuration for tests.
    #[cfg(test)]
    pub fn local_test(source: &str, dest: &str) -> SyncConfig {
        SyncConfig {
            source: Location::parse(source).unwrap(),
            dest: Location::parse(dest).unwrap(),
            factor: 1,
            part_size: 8 * 1024 * 1024,
            storage_class: StorageClass::Standard,
            initial: false,
            with_attrs: true,
            check: CheckMode::None,
            check_scope: CheckScope::Incr,
            defaults: DefaultAttrs {
                uid: nix::unistd::getuid().as_raw(),
                gid: nix::unistd::getgid().as_raw(),
                mode: "775".into(),
            },
            region: None,
        }
    }
}
