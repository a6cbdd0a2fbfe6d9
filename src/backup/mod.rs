//! Backup and restore orchestration
//!
//! The orchestrators sequence the per-run pipelines over the abstract store
//! and producer interfaces; both are linear state machines with a single
//! terminal failure path.

pub mod orchestrator;
pub mod restore;

pub use orchestrator::{BackupOrchestrator, BackupOutcome};
pub use restore::RestoreOrchestrator;
