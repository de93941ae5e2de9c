//! Door queries

use chrono::{DateTime, Utc};
use prospect_common::db::Door;
use prospect_common::{uuid_utils, DoorStatus, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

const DOOR_COLUMNS: &str = r#"
    id, building_id, number, custom_label, floor, status, repassage_count,
    appointment_at, comment, last_visited_at, created_at, updated_at
"#;

/// Door count for one (building, raw status) pair
///
/// `status` is the persisted text, not yet checked against the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingStatusCount {
    pub building_id: String,
    pub status: String,
    pub count: i64,
}

/// Insert a fresh door: NOT_VISITED, no repassage
pub async fn insert_door<'e, E>(
    executor: E,
    building_id: Uuid,
    floor: i64,
    number: i64,
    now: DateTime<Utc>,
) -> Result<Door>
where
    E: SqliteExecutor<'e>,
{
    let door = Door {
        id: uuid_utils::generate(),
        building_id,
        number,
        custom_label: None,
        floor,
        status: DoorStatus::NotVisited,
        repassage_count: 0,
        appointment_at: None,
        comment: None,
        last_visited_at: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO doors (id, building_id, number, floor, status, repassage_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(door.id.to_string())
    .bind(door.building_id.to_string())
    .bind(door.number)
    .bind(door.floor)
    .bind(door.status.as_str())
    .bind(door.created_at)
    .bind(door.updated_at)
    .execute(executor)
    .await?;

    Ok(door)
}

/// Load door by id
pub async fn load_door<'e, E>(executor: E, id: Uuid) -> Result<Option<Door>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM doors WHERE id = ?", DOOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(Door::from_row).transpose()
}

/// Doors of a building ordered by floor then number
pub async fn list_doors(pool: &SqlitePool, building_id: Uuid) -> Result<Vec<Door>> {
    let sql = format!(
        "SELECT {} FROM doors WHERE building_id = ? ORDER BY floor, number",
        DOOR_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(building_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(Door::from_row).collect()
}

/// Persist the mutable visit fields of a door
pub async fn write_door_visit<'e, E>(executor: E, door: &Door) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE doors SET
            status = ?,
            repassage_count = ?,
            appointment_at = ?,
            comment = ?,
            custom_label = ?,
            last_visited_at = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(door.status.as_str())
    .bind(door.repassage_count)
    .bind(door.appointment_at)
    .bind(&door.comment)
    .bind(&door.custom_label)
    .bind(door.last_visited_at)
    .bind(door.updated_at)
    .bind(door.id.to_string())
    .execute(executor)
    .await?;

    Ok(())
}

/// Door counts grouped by building and status across every building
/// owned by `salesperson_id`
pub async fn status_counts_for_salesperson(
    pool: &SqlitePool,
    salesperson_id: Uuid,
) -> Result<Vec<BuildingStatusCount>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT d.building_id, d.status, COUNT(*)
        FROM doors d
        JOIN buildings b ON b.id = d.building_id
        WHERE b.salesperson_id = ?
        GROUP BY d.building_id, d.status
        ORDER BY d.building_id, d.status
        "#,
    )
    .bind(salesperson_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(building_id, status, count)| BuildingStatusCount {
            building_id,
            status,
            count,
        })
        .collect())
}
