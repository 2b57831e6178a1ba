use super::Dialect;
use crate::models::EngineKind;

/// MySQL and MariaDB, scoped to the connection's current database.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::MySql
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn list_tables(&self) -> &'static str {
        r#"
        SELECT TABLE_NAME AS table_name,
               TABLE_COMMENT AS table_comment
        FROM information_schema.tables
        WHERE table_schema = DATABASE()
        "#
    }

    fn table_info(&self) -> &'static str {
        r#"
        SELECT TABLE_NAME AS table_name,
               TABLE_COMMENT AS table_comment
        FROM information_schema.tables
        WHERE table_schema = DATABASE()
          AND table_name = ?
        "#
    }

    fn columns_of(&self) -> &'static str {
        r#"
        SELECT COLUMN_NAME AS column_name,
               COLUMN_TYPE AS column_type,
               COLUMN_COMMENT AS column_comment,
               IS_NULLABLE AS is_nullable,
               COLUMN_DEFAULT AS column_default
        FROM information_schema.columns
        WHERE table_schema = DATABASE()
          AND table_name = ?
        ORDER BY ordinal_position
        "#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_to_current_database() {
        let d = MySqlDialect;
        assert!(d.list_tables().contains("DATABASE()"));
        assert!(d.columns_of().contains("COLUMN_TYPE"));
        assert!(d.columns_of().contains("ORDER BY ordinal_position"));
    }
}
