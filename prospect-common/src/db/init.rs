//! Database initialization
//!
//! Creates the database on first run and brings the schema up with
//! idempotent `CREATE TABLE IF NOT EXISTS` statements, so calling it on an
//! existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows the sync worker to read while a door write is in flight
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// Every connection to `sqlite::memory:` is a separate database, so the
/// pool is capped at one connection that is never recycled.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_salespeople_table(pool).await?;
    create_zones_table(pool).await?;
    create_zone_assignments_table(pool).await?;
    create_buildings_table(pool).await?;
    create_doors_table(pool).await?;
    create_statistics_table(pool).await?;

    Ok(())
}

pub async fn create_salespeople_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS salespeople (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_zones_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Zone assignments are written by the territory service. `zone_id` is not
/// a foreign key; it is checked when the current zone is resolved.
pub async fn create_zone_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zone_assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            salesperson_id TEXT NOT NULL REFERENCES salespeople(id) ON DELETE CASCADE,
            zone_id TEXT NOT NULL,
            assigned_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_zone_assignments_salesperson ON zone_assignments(salesperson_id, assigned_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_buildings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS buildings (
            id TEXT PRIMARY KEY,
            address TEXT NOT NULL,
            floor_count INTEGER NOT NULL CHECK (floor_count >= 1),
            doors_per_floor INTEGER NOT NULL CHECK (doors_per_floor >= 1),
            salesperson_id TEXT REFERENCES salespeople(id) ON DELETE SET NULL,
            zone_id TEXT REFERENCES zones(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_buildings_salesperson ON buildings(salesperson_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// `status` carries no CHECK constraint: rows imported from older systems
/// may hold names outside the taxonomy and must surface as `UnknownStatus`
/// when read, not fail the import.
pub async fn create_doors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doors (
            id TEXT PRIMARY KEY,
            building_id TEXT NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
            number INTEGER NOT NULL,
            custom_label TEXT,
            floor INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'NOT_VISITED',
            repassage_count INTEGER NOT NULL DEFAULT 0 CHECK (repassage_count >= 0),
            appointment_at TEXT,
            comment TEXT,
            last_visited_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doors_building ON doors(building_id, status)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_statistics_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statistics (
            id TEXT PRIMARY KEY,
            salesperson_id TEXT NOT NULL UNIQUE REFERENCES salespeople(id) ON DELETE CASCADE,
            zone_id TEXT,
            contracts_signed INTEGER NOT NULL DEFAULT 0,
            appointments_booked INTEGER NOT NULL DEFAULT 0,
            refusals INTEGER NOT NULL DEFAULT 0,
            buildings_visited INTEGER NOT NULL DEFAULT 0,
            prospected_buildings_count INTEGER NOT NULL DEFAULT 0,
            prospected_doors_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = init_in_memory().await.unwrap();
        create_schema(&pool).await.expect("second run should be a no-op");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(
            names,
            vec!["buildings", "doors", "salespeople", "statistics", "zone_assignments", "zones"]
        );
    }

    #[tokio::test]
    async fn test_statistics_unique_per_salesperson() {
        let pool = init_in_memory().await.unwrap();
        sqlx::query("INSERT INTO salespeople (id, first_name, last_name) VALUES ('s1', 'A', 'B')")
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO statistics (id, salesperson_id, updated_at) VALUES (?, 's1', '2026-01-01T00:00:00Z')";
        sqlx::query(insert).bind("a").execute(&pool).await.unwrap();
        let dup = sqlx::query(insert).bind("b").execute(&pool).await;

        assert!(dup.is_err(), "second aggregate row for one salesperson must be rejected");
    }
}
