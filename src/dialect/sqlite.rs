use super::Dialect;
use crate::models::EngineKind;

/// SQLite has no comment support; comments are always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::SQLite
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn list_tables(&self) -> &'static str {
        r#"
        SELECT name AS table_name,
               '' AS table_comment
        FROM sqlite_master
        WHERE type = 'table'
          AND substr(name, 1, 7) <> 'sqlite_'
        "#
    }

    fn table_info(&self) -> &'static str {
        r#"
        SELECT name AS table_name,
               '' AS table_comment
        FROM sqlite_master
        WHERE type = 'table'
          AND substr(name, 1, 7) <> 'sqlite_'
          AND name = ?
        "#
    }

    fn columns_of(&self) -> &'static str {
        r#"
        SELECT name AS column_name,
               type AS column_type,
               '' AS column_comment,
               CASE WHEN "notnull" = 0 THEN 'YES' ELSE 'NO' END AS is_nullable,
               dflt_value AS column_default
        FROM pragma_table_info(?)
        ORDER BY cid
        "#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_tables_excluded() {
        let d = SqliteDialect;
        assert!(d.list_tables().contains("substr(name, 1, 7) <> 'sqlite_'"));
        assert!(d.table_info().contains("substr(name, 1, 7) <> 'sqlite_'"));
        assert!(d.columns_of().contains("pragma_table_info(?)"));
    }
}
