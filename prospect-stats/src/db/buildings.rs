//! Building queries

use chrono::{DateTime, Utc};
use prospect_common::db::Building;
use prospect_common::{time, uuid_utils, Result};
use serde::Deserialize;
use sqlx::SqliteExecutor;
use uuid::Uuid;

/// Fields supplied when a building is provisioned
#[derive(Debug, Clone, Deserialize)]
pub struct NewBuilding {
    pub address: String,
    pub floor_count: i64,
    pub doors_per_floor: i64,
    pub salesperson_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

pub async fn insert_building<'e, E>(executor: E, new: &NewBuilding, now: DateTime<Utc>) -> Result<Building>
where
    E: SqliteExecutor<'e>,
{
    let building = Building {
        id: uuid_utils::generate(),
        address: new.address.clone(),
        floor_count: new.floor_count,
        doors_per_floor: new.doors_per_floor,
        salesperson_id: new.salesperson_id,
        zone_id: new.zone_id,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO buildings (
            id, address, floor_count, doors_per_floor, salesperson_id, zone_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(building.id.to_string())
    .bind(&building.address)
    .bind(building.floor_count)
    .bind(building.doors_per_floor)
    .bind(building.salesperson_id.map(|id| id.to_string()))
    .bind(building.zone_id.map(|id| id.to_string()))
    .bind(building.created_at)
    .bind(building.updated_at)
    .execute(executor)
    .await?;

    Ok(building)
}

/// Load building by id
pub async fn load_building<'e, E>(executor: E, id: Uuid) -> Result<Option<Building>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT id, address, floor_count, doors_per_floor, salesperson_id, zone_id,
               created_at, updated_at
        FROM buildings
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(Building::from_row).transpose()
}

/// Bump `updated_at` after a contained door changed
pub async fn touch_building<'e, E>(executor: E, id: Uuid, now: DateTime<Utc>) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE buildings SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id.to_string())
        .execute(executor)
        .await?;

    Ok(())
}

/// Hand a building over to another salesperson (or none)
pub async fn assign_building(
    pool: &sqlx::SqlitePool,
    id: Uuid,
    salesperson_id: Option<Uuid>,
) -> Result<()> {
    sqlx::query("UPDATE buildings SET salesperson_id = ?, updated_at = ? WHERE id = ?")
        .bind(salesperson_id.map(|s| s.to_string()))
        .bind(time::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
