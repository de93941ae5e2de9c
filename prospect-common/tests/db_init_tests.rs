//! Tests for database initialization on disk

use prospect_common::db::init::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("prospect.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("prospect.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO zones (id, name) VALUES ('z1', 'Nord')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.expect("reopen should succeed");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM zones")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "existing rows survive re-initialization");
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("fk.db")).await.unwrap();

    let orphan = sqlx::query(
        "INSERT INTO doors (id, building_id, number, floor, created_at, updated_at) \
         VALUES ('d1', 'missing', 1, 1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;

    assert!(orphan.is_err(), "door without building must be rejected");
}
