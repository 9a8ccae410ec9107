//! Object storage module
//!
//! Blocking S3 access for scan and transfer threads. One SDK configuration
//! is loaded per run; each thread owns its own client built from it.

mod s3;

pub use s3::*;
