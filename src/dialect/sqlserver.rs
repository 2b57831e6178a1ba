use super::Dialect;
use crate::models::EngineKind;

/// Microsoft SQL Server.
///
/// Descriptions live in `sys.extended_properties` under `MS_Description`.
/// The property filter sits in the join condition so tables and columns
/// without a description are still returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::SqlServer
    }

    fn placeholder(&self) -> &'static str {
        "@P1"
    }

    fn list_tables(&self) -> &'static str {
        r#"
        SELECT t.name AS table_name,
               COALESCE(CAST(ep.value AS NVARCHAR(4000)), N'') AS table_comment
        FROM sys.tables t
        LEFT JOIN sys.extended_properties ep
               ON ep.major_id = t.object_id
              AND ep.minor_id = 0
              AND ep.class = 1
              AND ep.name = N'MS_Description'
        "#
    }

    fn table_info(&self) -> &'static str {
        r#"
        SELECT t.name AS table_name,
               COALESCE(CAST(ep.value AS NVARCHAR(4000)), N'') AS table_comment
        FROM sys.tables t
        LEFT JOIN sys.extended_properties ep
               ON ep.major_id = t.object_id
              AND ep.minor_id = 0
              AND ep.class = 1
              AND ep.name = N'MS_Description'
        WHERE t.name = @P1
        "#
    }

    fn columns_of(&self) -> &'static str {
        r#"
        SELECT c.name AS column_name,
               ty.name AS column_type,
               COALESCE(CAST(ep.value AS NVARCHAR(4000)), N'') AS column_comment,
               CASE WHEN c.is_nullable = 1 THEN 'YES' ELSE 'NO' END AS is_nullable,
               OBJECT_DEFINITION(c.default_object_id) AS column_default
        FROM sys.columns c
        JOIN sys.types ty ON c.user_type_id = ty.user_type_id
        LEFT JOIN sys.extended_properties ep
               ON ep.major_id = c.object_id
              AND ep.minor_id = c.column_id
              AND ep.class = 1
              AND ep.name = N'MS_Description'
        WHERE c.object_id = OBJECT_ID(@P1)
        ORDER BY c.column_id
        "#
    }
}
