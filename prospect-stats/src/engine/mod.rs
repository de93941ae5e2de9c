//! Statistics engine
//!
//! **Module Structure:**
//! - `core.rs`: `StatsEngine`, per-building sync and per-salesperson refresh
//! - `recalc.rs`: Bulk recalculation over every salesperson
//! - `coherence.rs`: Read-only audit of stored aggregates against ground truth

mod coherence;
mod core;
mod recalc;

pub use self::coherence::{AuditedCounters, CoherenceMismatch, CoherenceReport};
pub use self::core::{StatsEngine, SyncOutcome};
pub use self::recalc::RecalcReport;
