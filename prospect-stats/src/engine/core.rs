//! Per-building statistics sync
//!
//! Every sync recomputes the complete aggregate from persisted doors and
//! overwrites the stored row. Concurrent syncs for one salesperson can
//! therefore interleave in any order: the last one to finish stores a
//! consistent snapshot, never a partially applied delta.

use crate::db::{buildings, statistics, zones};
use crate::ground_truth;
use prospect_common::db::StatisticAggregate;
use prospect_common::{time, Result};
use sqlx::SqlitePool;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Result of a sync attempt that did not fail
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Aggregate recomputed and stored
    Updated(StatisticAggregate),
    /// Building no longer exists; nothing to do
    BuildingNotFound,
    /// Building has no owning salesperson; nothing to do
    Unassigned,
}

/// Statistics synchronization engine
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct StatsEngine {
    pub(super) db: SqlitePool,
}

impl StatsEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Re-sync the statistics of the salesperson owning `building_id`
    ///
    /// Invoked after a door status write commits. Never fails: errors are
    /// logged and the stale aggregate is left for the next recalculation.
    pub async fn sync(&self, building_id: Uuid) {
        match self.try_sync(building_id).await {
            Ok(SyncOutcome::Updated(aggregate)) => {
                debug!(
                    building_id = %building_id,
                    salesperson_id = %aggregate.salesperson_id,
                    "Statistics synced"
                );
            }
            Ok(SyncOutcome::BuildingNotFound) => {
                warn!(building_id = %building_id, "Statistics sync skipped: building not found");
            }
            Ok(SyncOutcome::Unassigned) => {
                warn!(building_id = %building_id, "Statistics sync skipped: building has no salesperson");
            }
            Err(e) => {
                error!(building_id = %building_id, error = %e, "Statistics sync failed");
            }
        }
    }

    /// Fallible form of [`sync`](Self::sync)
    pub async fn try_sync(&self, building_id: Uuid) -> Result<SyncOutcome> {
        let Some(building) = buildings::load_building(&self.db, building_id).await? else {
            return Ok(SyncOutcome::BuildingNotFound);
        };

        let Some(salesperson_id) = building.salesperson_id else {
            return Ok(SyncOutcome::Unassigned);
        };

        let aggregate = self.refresh_salesperson(salesperson_id).await?;
        Ok(SyncOutcome::Updated(aggregate))
    }

    /// Recompute and store the aggregate of one salesperson
    ///
    /// Ground truth first, then the current zone (resolved fresh, never
    /// cached), then a single upsert keyed by salesperson.
    pub async fn refresh_salesperson(&self, salesperson_id: Uuid) -> Result<StatisticAggregate> {
        let counters = ground_truth::compute_for(&self.db, salesperson_id).await?;
        let zone_id = zones::current_zone_for(&self.db, salesperson_id).await?;

        statistics::upsert_aggregate(&self.db, salesperson_id, zone_id, &counters, time::now()).await
    }
}
