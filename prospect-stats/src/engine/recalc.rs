//! Bulk recalculation of every salesperson's aggregate

use super::core::StatsEngine;
use crate::db::salespeople;
use prospect_common::Result;
use serde::Serialize;
use tracing::{error, info};

/// Tally returned by [`StatsEngine::recalc_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecalcReport {
    pub updated: usize,
    pub errors: usize,
}

impl StatsEngine {
    /// Recompute and store the aggregate of every salesperson
    ///
    /// A failure for one salesperson is logged and counted, then the job
    /// moves on. Only failing to list salespeople aborts the run.
    pub async fn recalc_all(&self) -> Result<RecalcReport> {
        let ids = salespeople::list_salesperson_ids(&self.db).await?;
        info!(salespeople = ids.len(), "Recalculating statistics");

        let mut report = RecalcReport::default();

        for salesperson_id in ids {
            match self.refresh_salesperson(salesperson_id).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    report.errors += 1;
                    error!(
                        salesperson_id = %salesperson_id,
                        error = %e,
                        "Recalculation failed for salesperson"
                    );
                }
            }
        }

        info!(
            updated = report.updated,
            errors = report.errors,
            "Recalculation complete"
        );

        Ok(report)
    }
}
