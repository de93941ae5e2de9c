//! Ground truth computation
//!
//! Derives a salesperson's counters by scanning the doors of every building
//! they own and applying the status taxonomy. Read-only and deterministic
//! for a given door snapshot, so the sync engine, the recalculation job and
//! the coherence validator can all rely on it.

use crate::db::doors::{status_counts_for_salesperson, BuildingStatusCount};
use prospect_common::db::StatCounters;
use prospect_common::status::{contribution_of, CounterContribution};
use prospect_common::{DoorStatus, Result};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Counters implied by the current doors of `salesperson_id`
///
/// Fails with `UnknownStatus` if any door holds a status outside the
/// taxonomy.
pub async fn compute_for(pool: &SqlitePool, salesperson_id: Uuid) -> Result<StatCounters> {
    let groups = status_counts_for_salesperson(pool, salesperson_id).await?;
    let counters = fold_counts(&groups)?;

    tracing::trace!(
        salesperson_id = %salesperson_id,
        groups = groups.len(),
        ?counters,
        "Computed ground truth"
    );

    Ok(counters)
}

/// Fold grouped (building, status, count) rows into counters
pub fn fold_counts(groups: &[BuildingStatusCount]) -> Result<StatCounters> {
    let mut totals = CounterContribution::default();
    let mut visited_buildings = BTreeSet::new();

    for group in groups {
        let status: DoorStatus = group.status.parse()?;
        let contribution = contribution_of(status, group.count);

        if contribution.prospected > 0 {
            visited_buildings.insert(group.building_id.as_str());
        }
        totals = totals + contribution;
    }

    let buildings_visited = visited_buildings.len() as i64;

    Ok(StatCounters {
        contracts_signed: totals.contracts,
        appointments_booked: totals.appointments,
        refusals: totals.refusals,
        buildings_visited,
        // Same rule as buildings_visited for now; stored separately
        prospected_buildings_count: buildings_visited,
        prospected_doors_count: totals.prospected,
    })
}
