//! Coherence audit
//!
//! Compares every stored aggregate with freshly computed ground truth.
//! Strictly read-only; repair is left to the operator (typically a
//! recalculation run).

use super::core::StatsEngine;
use crate::db::statistics;
use crate::ground_truth;
use prospect_common::db::StatCounters;
use prospect_common::Result;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Counters compared by the audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditedCounters {
    pub contracts_signed: i64,
    pub appointments_booked: i64,
    pub refusals: i64,
    pub buildings_visited: i64,
}

impl From<&StatCounters> for AuditedCounters {
    fn from(c: &StatCounters) -> Self {
        Self {
            contracts_signed: c.contracts_signed,
            appointments_booked: c.appointments_booked,
            refusals: c.refusals,
            buildings_visited: c.buildings_visited,
        }
    }
}

/// One stored aggregate that disagrees with ground truth
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoherenceMismatch {
    pub salesperson_id: Uuid,
    /// Stored values
    pub current: AuditedCounters,
    /// Recomputed values
    pub real: AuditedCounters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoherenceReport {
    pub valid_count: usize,
    pub invalid: Vec<CoherenceMismatch>,
}

impl CoherenceReport {
    pub fn is_coherent(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl StatsEngine {
    /// Audit every stored aggregate against ground truth
    ///
    /// Rows whose ground truth cannot be computed are logged and counted
    /// neither valid nor invalid.
    pub async fn validate(&self) -> Result<CoherenceReport> {
        let aggregates = statistics::list_aggregates(&self.db).await?;
        let mut report = CoherenceReport::default();

        for aggregate in &aggregates {
            let real = match ground_truth::compute_for(&self.db, aggregate.salesperson_id).await {
                Ok(counters) => AuditedCounters::from(&counters),
                Err(e) => {
                    warn!(
                        salesperson_id = %aggregate.salesperson_id,
                        error = %e,
                        "Coherence check skipped: ground truth unavailable"
                    );
                    continue;
                }
            };
            let current = AuditedCounters::from(&aggregate.counters);

            if current == real {
                report.valid_count += 1;
            } else {
                warn!(
                    salesperson_id = %aggregate.salesperson_id,
                    ?current,
                    ?real,
                    "Statistics drift detected"
                );
                report.invalid.push(CoherenceMismatch {
                    salesperson_id: aggregate.salesperson_id,
                    current,
                    real,
                });
            }
        }

        info!(
            checked = aggregates.len(),
            valid = report.valid_count,
            invalid = report.invalid.len(),
            "Coherence check complete"
        );

        Ok(report)
    }
}
