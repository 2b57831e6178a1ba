//! End-to-end tool invocation over SQLite.

use database_mcp::DbError;
use database_mcp::config::settings_from_url;
use database_mcp::db::DbPool;
use database_mcp::tools::{EXECUTE_SQL, GET_TABLE_DETAIL, GET_TABLES, RawSqlCapability, ToolAdapter};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tempfile::TempDir;

async fn adapter(dir: &TempDir) -> ToolAdapter {
    let path = dir.path().join("tools.db");
    let settings = settings_from_url(&format!("sqlite://{}", path.display())).unwrap();
    let pool = DbPool::connect(&settings).await.unwrap();
    ToolAdapter::new(Arc::new(pool)).with_timeout(5)
}

fn args(value: Value) -> Option<Map<String, Value>> {
    value.as_object().cloned()
}

async fn call(adapter: &ToolAdapter, tool: &str, arguments: Value) -> Value {
    let text = adapter.invoke(tool, args(arguments)).await.unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn test_full_workflow() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter(&dir).await;

    call(
        &adapter,
        EXECUTE_SQL,
        json!({"query": "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL, pinned INTEGER DEFAULT 0)"}),
    )
    .await;

    let tables = call(&adapter, GET_TABLES, json!({})).await;
    assert_eq!(tables, json!([{"table_name": "notes", "table_comment": ""}]));

    let detail = call(&adapter, GET_TABLE_DETAIL, json!({"table_name": "notes"})).await;
    assert_eq!(
        detail,
        json!({
            "table_name": "notes",
            "table_comment": "",
            "columns": [
                {"column_name": "id", "column_type": "INTEGER", "column_comment": "", "is_nullable": "YES", "column_default": null},
                {"column_name": "body", "column_type": "TEXT", "column_comment": "", "is_nullable": "NO", "column_default": null},
                {"column_name": "pinned", "column_type": "INTEGER", "column_comment": "", "is_nullable": "YES", "column_default": "0"}
            ]
        })
    );

    let inserted = call(
        &adapter,
        EXECUTE_SQL,
        json!({"query": "INSERT INTO notes (body) VALUES ('first'), ('second')"}),
    )
    .await;
    assert_eq!(inserted, json!({"rows_affected": 2}));

    let rows = call(
        &adapter,
        EXECUTE_SQL,
        json!({"query": "SELECT id, body FROM notes ORDER BY id"}),
    )
    .await;
    assert_eq!(
        rows,
        json!([{"id": 1, "body": "first"}, {"id": 2, "body": "second"}])
    );
}

#[tokio::test]
async fn test_missing_table_detail_is_empty() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter(&dir).await;

    let detail = call(&adapter, GET_TABLE_DETAIL, json!({"table_name": "missing"})).await;
    assert_eq!(
        detail,
        json!({"table_name": "", "table_comment": "", "columns": []})
    );
}

#[tokio::test]
async fn test_argument_errors() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter(&dir).await;

    let err = adapter.invoke(GET_TABLE_DETAIL, None).await.unwrap_err();
    assert!(matches!(err, DbError::BadArgument { .. }));

    let err = adapter
        .invoke(EXECUTE_SQL, args(json!({"query": ["SELECT 1"]})))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::BadArgument { .. }));
}

#[tokio::test]
async fn test_invalid_sql_through_tool() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter(&dir).await;

    let err = adapter
        .invoke(EXECUTE_SQL, args(json!({"query": "SELEC 1"})))
        .await
        .unwrap_err();
    assert!(err.is_query_failure());
}

#[tokio::test]
async fn test_disabled_raw_sql_keeps_introspection() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter(&dir).await.with_raw_sql(RawSqlCapability::Disabled);

    assert_eq!(call(&adapter, GET_TABLES, json!({})).await, json!([]));
    let err = adapter
        .invoke(EXECUTE_SQL, args(json!({"query": "SELECT 1"})))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::CapabilityDisabled { .. }));
}
