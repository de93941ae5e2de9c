//! Shared fixtures for prospect-stats integration tests

#![allow(dead_code)]

use chrono::Utc;
use prospect_common::db::init_in_memory;
use prospect_common::DoorStatus;
use prospect_stats::db::buildings::{insert_building, NewBuilding};
use prospect_stats::db::doors::insert_door;
use prospect_stats::db::salespeople::create_salesperson;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Fresh in-memory database with the full schema
pub async fn setup_test_db() -> SqlitePool {
    init_in_memory()
        .await
        .expect("Should create in-memory database")
}

pub async fn add_salesperson(pool: &SqlitePool, last_name: &str) -> Uuid {
    create_salesperson(pool, "Test", last_name, None)
        .await
        .expect("Should create salesperson")
        .id
}

/// Building owned by `owner` with doors in the given statuses
///
/// Statuses are written straight to the table so fixtures can hold any
/// combination, including appointments without a date.
pub async fn add_building(
    pool: &SqlitePool,
    owner: Option<Uuid>,
    doors: &[(DoorStatus, usize)],
) -> (Uuid, Vec<Uuid>) {
    let total: usize = doors.iter().map(|(_, n)| n).sum();
    let building = insert_building(
        pool,
        &NewBuilding {
            address: "12 rue des Lilas".to_string(),
            floor_count: 1,
            doors_per_floor: total.max(1) as i64,
            salesperson_id: owner,
            zone_id: None,
        },
        Utc::now(),
    )
    .await
    .expect("Should insert building");

    let mut door_ids = Vec::with_capacity(total);
    let mut number = 100;
    for (status, count) in doors {
        for _ in 0..*count {
            number += 1;
            let door = insert_door(pool, building.id, 1, number, Utc::now())
                .await
                .expect("Should insert door");
            set_status_raw(pool, door.id, status.as_str()).await;
            door_ids.push(door.id);
        }
    }

    (building.id, door_ids)
}

/// Overwrite a door's status column without any validation
pub async fn set_status_raw(pool: &SqlitePool, door_id: Uuid, status: &str) {
    sqlx::query("UPDATE doors SET status = ? WHERE id = ?")
        .bind(status)
        .bind(door_id.to_string())
        .execute(pool)
        .await
        .expect("Should update door status");
}

pub async fn aggregate_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM statistics")
        .fetch_one(pool)
        .await
        .expect("Should count aggregates")
}
