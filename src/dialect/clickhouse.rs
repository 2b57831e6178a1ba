use super::Dialect;
use crate::models::EngineKind;

/// ClickHouse, scoped to the session's current database.
///
/// ClickHouse has no separate nullability flag; a column is nullable when its
/// type is wrapped in `Nullable(...)`. An empty `default_expression` means no
/// default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickHouseDialect;

impl Dialect for ClickHouseDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::ClickHouse
    }

    fn placeholder(&self) -> &'static str {
        "{table_name:String}"
    }

    fn list_tables(&self) -> &'static str {
        r#"
        SELECT name AS table_name,
               comment AS table_comment
        FROM system.tables
        WHERE database = currentDatabase()
        "#
    }

    fn table_info(&self) -> &'static str {
        r#"
        SELECT name AS table_name,
               comment AS table_comment
        FROM system.tables
        WHERE database = currentDatabase()
          AND name = {table_name:String}
        "#
    }

    fn columns_of(&self) -> &'static str {
        r#"
        SELECT name AS column_name,
               type AS column_type,
               comment AS column_comment,
               if(startsWith(type, 'Nullable('), 'YES', 'NO') AS is_nullable,
               nullIf(default_expression, '') AS column_default
        FROM system.columns
        WHERE database = currentDatabase()
          AND table = {table_name:String}
        ORDER BY position
        "#
    }
}
