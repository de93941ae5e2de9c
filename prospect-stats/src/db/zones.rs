//! Zone and zone assignment queries

use chrono::{DateTime, Utc};
use prospect_common::db::Zone;
use prospect_common::{uuid_utils, Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn create_zone(pool: &SqlitePool, name: &str) -> Result<Zone> {
    let zone = Zone {
        id: uuid_utils::generate(),
        name: name.to_string(),
    };

    sqlx::query("INSERT INTO zones (id, name) VALUES (?, ?)")
        .bind(zone.id.to_string())
        .bind(&zone.name)
        .execute(pool)
        .await?;

    Ok(zone)
}

/// Record that `salesperson_id` works `zone_id` from `assigned_at` on
pub async fn assign_zone(
    pool: &SqlitePool,
    salesperson_id: Uuid,
    zone_id: Uuid,
    assigned_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO zone_assignments (salesperson_id, zone_id, assigned_at) VALUES (?, ?, ?)")
        .bind(salesperson_id.to_string())
        .bind(zone_id.to_string())
        .bind(assigned_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Current zone of a salesperson, read fresh on every call
///
/// The most recent assignment wins. `Ok(None)` when the salesperson has
/// never been assigned; `NotFound` when the latest assignment points at a
/// zone that does not exist.
pub async fn current_zone_for(pool: &SqlitePool, salesperson_id: Uuid) -> Result<Option<Uuid>> {
    let row: Option<(String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT za.zone_id, z.id
        FROM zone_assignments za
        LEFT JOIN zones z ON z.id = za.zone_id
        WHERE za.salesperson_id = ?
        ORDER BY za.assigned_at DESC, za.id DESC
        LIMIT 1
        "#,
    )
    .bind(salesperson_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        None => Ok(None),
        Some((zone_id, Some(_))) => Ok(Some(uuid_utils::parse(&zone_id)?)),
        Some((zone_id, None)) => Err(Error::NotFound(format!(
            "zone {} assigned to salesperson {}",
            zone_id, salesperson_id
        ))),
    }
}
