//! Worker pool and run orchestration
//!
//! The engine owns one run end to end: it resolves the copy mode from the
//! two addresses, opens the checkpoint, drives the producer and worker pool
//! through the copy phase, runs the requested verification, and persists the
//! outcome.

mod pipeline;
mod session;

pub use pipeline::{RunSummary, SyncEngine};
pub use session::{RunStats, SyncSession, QUEUE_CAPACITY};
