//! Statistic aggregate queries
//!
//! Rows are keyed by salesperson (UNIQUE) and only ever written through
//! [`upsert_aggregate`], which replaces every counter at once.

use chrono::{DateTime, Utc};
use prospect_common::db::{StatCounters, StatisticAggregate};
use prospect_common::{uuid_utils, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

const AGGREGATE_COLUMNS: &str = r#"
    id, salesperson_id, zone_id, contracts_signed, appointments_booked, refusals,
    buildings_visited, prospected_buildings_count, prospected_doors_count, updated_at
"#;

/// Insert or replace the aggregate for `salesperson_id`
///
/// The row id is kept across updates; only the counters, zone and
/// timestamp change.
pub async fn upsert_aggregate(
    pool: &SqlitePool,
    salesperson_id: Uuid,
    zone_id: Option<Uuid>,
    counters: &StatCounters,
    now: DateTime<Utc>,
) -> Result<StatisticAggregate> {
    sqlx::query(
        r#"
        INSERT INTO statistics (
            id, salesperson_id, zone_id, contracts_signed, appointments_booked, refusals,
            buildings_visited, prospected_buildings_count, prospected_doors_count, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(salesperson_id) DO UPDATE SET
            zone_id = excluded.zone_id,
            contracts_signed = excluded.contracts_signed,
            appointments_booked = excluded.appointments_booked,
            refusals = excluded.refusals,
            buildings_visited = excluded.buildings_visited,
            prospected_buildings_count = excluded.prospected_buildings_count,
            prospected_doors_count = excluded.prospected_doors_count,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(uuid_utils::generate().to_string())
    .bind(salesperson_id.to_string())
    .bind(zone_id.map(|id| id.to_string()))
    .bind(counters.contracts_signed)
    .bind(counters.appointments_booked)
    .bind(counters.refusals)
    .bind(counters.buildings_visited)
    .bind(counters.prospected_buildings_count)
    .bind(counters.prospected_doors_count)
    .bind(now)
    .execute(pool)
    .await?;

    load_aggregate(pool, salesperson_id).await?.ok_or_else(|| {
        prospect_common::Error::Internal(format!(
            "aggregate for salesperson {} missing after upsert",
            salesperson_id
        ))
    })
}

/// Load the aggregate of one salesperson
pub async fn load_aggregate(
    pool: &SqlitePool,
    salesperson_id: Uuid,
) -> Result<Option<StatisticAggregate>> {
    let sql = format!(
        "SELECT {} FROM statistics WHERE salesperson_id = ?",
        AGGREGATE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(salesperson_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(StatisticAggregate::from_row).transpose()
}

/// Every stored aggregate, ordered by salesperson
pub async fn list_aggregates(pool: &SqlitePool) -> Result<Vec<StatisticAggregate>> {
    let sql = format!(
        "SELECT {} FROM statistics ORDER BY salesperson_id",
        AGGREGATE_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(StatisticAggregate::from_row).collect()
}
