//! Raw SQL execution against an on-disk SQLite database.

use database_mcp::DbError;
use database_mcp::config::settings_from_url;
use database_mcp::db::{DbPool, QueryExecutor};
use database_mcp::models::{QueryOutcome, Stage};
use serde_json::json;
use tempfile::TempDir;

async fn open_pool(dir: &TempDir) -> DbPool {
    let path = dir.path().join("exec.db");
    let settings = settings_from_url(&format!("sqlite://{}", path.display())).unwrap();
    DbPool::connect(&settings).await.unwrap()
}

#[tokio::test]
async fn test_select_one() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;

    let outcome = QueryExecutor::new().execute(&pool, "SELECT 1").await.unwrap();
    let rows = outcome.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0].values().next(), Some(&json!(1)));
    assert_eq!(serde_json::to_string(&outcome).unwrap(), r#"[{"1":1}]"#);
}

#[tokio::test]
async fn test_invalid_sql_is_query_error() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;

    let err = QueryExecutor::new()
        .execute(&pool, "SELEC 1")
        .await
        .unwrap_err();
    match err {
        DbError::Query { stage, message, .. } => {
            assert_eq!(stage, Stage::Execute);
            assert!(message.contains("syntax error"), "{message}");
        }
        other => panic!("expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_table_is_query_error() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;

    let err = QueryExecutor::new()
        .execute(&pool, "SELECT * FROM ghosts")
        .await
        .unwrap_err();
    assert!(err.is_query_failure());
    assert!(err.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_writes_report_affected_rows() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;
    let executor = QueryExecutor::new();

    let created = executor
        .execute(&pool, "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    assert_eq!(created, QueryOutcome::Rows(Vec::new()));

    let inserted = executor
        .execute(&pool, "INSERT INTO items (name) VALUES ('a'), ('b'), ('c')")
        .await
        .unwrap();
    assert_eq!(inserted.rows_affected(), Some(3));
    assert_eq!(serde_json::to_string(&inserted).unwrap(), r#"{"rows_affected":3}"#);

    let updated = executor
        .execute(&pool, "UPDATE items SET name = upper(name) WHERE id > 1")
        .await
        .unwrap();
    assert_eq!(updated.rows_affected(), Some(2));
}

#[tokio::test]
async fn test_rows_keep_column_order_and_types() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;
    let executor = QueryExecutor::new();

    executor
        .execute(
            &pool,
            "CREATE TABLE readings (id INTEGER, label TEXT, value REAL, note TEXT, raw BLOB);
             INSERT INTO readings VALUES (1, 'temp', 21.5, NULL, x'68656c6c6f');",
        )
        .await
        .unwrap();

    let outcome = executor
        .execute(&pool, "SELECT id, label, value, note, raw FROM readings")
        .await
        .unwrap();
    let row = &outcome.rows()[0];
    let keys: Vec<_> = row.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "label", "value", "note", "raw"]);
    assert_eq!(row["id"], json!(1));
    assert_eq!(row["label"], json!("temp"));
    assert_eq!(row["value"], json!(21.5));
    assert_eq!(row["note"], json!(null));
    assert_eq!(row["raw"], json!("hello"));
}

#[tokio::test]
async fn test_empty_result_set() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;
    let executor = QueryExecutor::new();

    executor
        .execute(&pool, "CREATE TABLE empty_t (id INTEGER)")
        .await
        .unwrap();
    let outcome = executor
        .execute(&pool, "SELECT * FROM empty_t")
        .await
        .unwrap();
    assert!(outcome.rows().is_empty());
    assert_eq!(serde_json::to_string(&outcome).unwrap(), "[]");
}

#[tokio::test]
async fn test_reads_and_ddl_after_write_affect_no_rows() {
    let dir = TempDir::new().unwrap();
    let pool = open_pool(&dir).await;
    let executor = QueryExecutor::new();

    executor
        .execute(&pool, "CREATE TABLE a (id INTEGER); CREATE TABLE e (id INTEGER)")
        .await
        .unwrap();
    let inserted = executor
        .execute(&pool, "INSERT INTO a VALUES (1), (2), (3)")
        .await
        .unwrap();
    assert_eq!(inserted.rows_affected(), Some(3));

    let empty = executor.execute(&pool, "SELECT * FROM e").await.unwrap();
    assert_eq!(empty, QueryOutcome::Rows(Vec::new()));

    let created = executor
        .execute(&pool, "CREATE TABLE f (id INTEGER)")
        .await
        .unwrap();
    assert_eq!(created, QueryOutcome::Rows(Vec::new()));

    let deleted = executor
        .execute(&pool, "DELETE FROM a WHERE id = 2")
        .await
        .unwrap();
    assert_eq!(deleted.rows_affected(), Some(1));
}
