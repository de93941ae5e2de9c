//! prospect-stats library - statistics synchronization and consistency
//!
//! Keeps each salesperson's aggregate counters in line with the statuses
//! of the doors they prospect:
//! - [`StatsEngine::sync`]: re-sync after a single door status change
//! - [`StatsEngine::recalc_all`]: rebuild every aggregate, tolerating failures
//! - [`StatsEngine::validate`]: read-only drift audit
//! - [`SyncHandle::notify`]: fire-and-forget hook used by door writes

pub mod db;
pub mod doors;
pub mod engine;
pub mod ground_truth;
pub mod sync_queue;

pub use doors::{DoorService, DoorStatusUpdate, SyncNotifier};
pub use engine::{AuditedCounters, CoherenceMismatch, CoherenceReport, RecalcReport, StatsEngine, SyncOutcome};
pub use sync_queue::{SyncHandle, SyncQueue};
