//! Salesperson queries

use prospect_common::db::Salesperson;
use prospect_common::{uuid_utils, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert a salesperson
pub async fn create_salesperson(
    pool: &SqlitePool,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
) -> Result<Salesperson> {
    let salesperson = Salesperson {
        id: uuid_utils::generate(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.map(str::to_string),
    };

    sqlx::query("INSERT INTO salespeople (id, first_name, last_name, email) VALUES (?, ?, ?, ?)")
        .bind(salesperson.id.to_string())
        .bind(&salesperson.first_name)
        .bind(&salesperson.last_name)
        .bind(&salesperson.email)
        .execute(pool)
        .await?;

    Ok(salesperson)
}

/// Ids of every salesperson, in stable order
pub async fn list_salesperson_ids(pool: &SqlitePool) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM salespeople ORDER BY id")
        .fetch_all(pool)
        .await?;

    ids.iter().map(|id| uuid_utils::parse(id)).collect()
}
