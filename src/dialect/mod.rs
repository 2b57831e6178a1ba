//! Dialect catalog.
//!
//! Maps an engine kind to the three catalog statements the introspector needs:
//! list all tables, look up one table, and list one table's columns in
//! ordinal order.
//!
//! Every statement projects the same aliases (`table_name`, `table_comment`,
//! `column_name`, `column_type`, `column_comment`, `is_nullable`,
//! `column_default`) so rows can be mapped without knowing the engine. The
//! table name is always bound as the first parameter using the engine's own
//! placeholder syntax; it is never spliced into the text.

mod clickhouse;
mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use clickhouse::ClickHouseDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::error::DbResult;
use crate::models::EngineKind;

/// Catalog statements for one engine.
pub trait Dialect: Send + Sync {
    /// Engine this dialect targets.
    fn engine(&self) -> EngineKind;

    /// Placeholder used for the table name parameter.
    fn placeholder(&self) -> &'static str;

    /// Every table in the current database/schema. Takes no parameters.
    fn list_tables(&self) -> &'static str;

    /// Zero or one row for the named table. Binds the table name once.
    fn table_info(&self) -> &'static str;

    /// Columns of the named table in ordinal order. Binds the table name once.
    fn columns_of(&self) -> &'static str;
}

static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static SQLITE: SqliteDialect = SqliteDialect;
static SQLSERVER: SqlServerDialect = SqlServerDialect;
static CLICKHOUSE: ClickHouseDialect = ClickHouseDialect;

/// Look up the dialect for an engine.
pub fn dialect_for(engine: EngineKind) -> &'static dyn Dialect {
    match engine {
        EngineKind::MySql => &MYSQL,
        EngineKind::Postgres => &POSTGRES,
        EngineKind::SQLite => &SQLITE,
        EngineKind::SqlServer => &SQLSERVER,
        EngineKind::ClickHouse => &CLICKHOUSE,
    }
}

/// Look up the dialect for an engine name such as `"postgres"` or `"mssql"`.
///
/// Fails with `UnsupportedDialect` for anything outside the supported set.
pub fn dialect_named(name: &str) -> DbResult<&'static dyn Dialect> {
    let engine: EngineKind = name.parse()?;
    Ok(dialect_for(engine))
}
