use super::Dialect;
use crate::models::EngineKind;

/// PostgreSQL, scoped to the `public` schema.
///
/// Comments come from `pg_description` through `obj_description` and
/// `col_description`, keyed on the relation oid. All outputs are cast to
/// `text` so they decode uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Postgres
    }

    fn placeholder(&self) -> &'static str {
        "$1"
    }

    fn list_tables(&self) -> &'static str {
        r#"
        SELECT t.table_name::text AS table_name,
               COALESCE(obj_description(c.oid, 'pg_class'), '')::text AS table_comment
        FROM information_schema.tables t
        JOIN pg_namespace n ON n.nspname = t.table_schema
        JOIN pg_class c ON c.relname = t.table_name AND c.relnamespace = n.oid
        WHERE t.table_schema = 'public'
        "#
    }

    fn table_info(&self) -> &'static str {
        r#"
        SELECT t.table_name::text AS table_name,
               COALESCE(obj_description(c.oid, 'pg_class'), '')::text AS table_comment
        FROM information_schema.tables t
        JOIN pg_namespace n ON n.nspname = t.table_schema
        JOIN pg_class c ON c.relname = t.table_name AND c.relnamespace = n.oid
        WHERE t.table_schema = 'public'
          AND t.table_name = $1
        "#
    }

    fn columns_of(&self) -> &'static str {
        r#"
        SELECT col.column_name::text AS column_name,
               col.data_type::text AS column_type,
               COALESCE(col_description(c.oid, col.ordinal_position::int), '')::text AS column_comment,
               col.is_nullable::text AS is_nullable,
               col.column_default::text AS column_default
        FROM information_schema.columns col
        JOIN pg_namespace n ON n.nspname = col.table_schema
        JOIN pg_class c ON c.relname = col.table_name AND c.relnamespace = n.oid
        WHERE col.table_schema = 'public'
          AND col.table_name = $1
        ORDER BY col.ordinal_position
        "#
    }
}
