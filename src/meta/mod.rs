//! Metadata normalization module
//!
//! Reduces filesystem stat results and object-store metadata to one shared
//! record shape so the copy and verification phases never branch on where an
//! entry came from.

pub mod fs;
pub mod object;
mod record;

pub use record::{DefaultAttrs, EntryKind, EntryRecord, EntryStatus};
