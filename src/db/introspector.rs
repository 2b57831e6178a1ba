//! Schema introspection.
//!
//! Resolves the connection's dialect, runs the catalog statements and maps
//! the generic rows onto `TableInfo` / `ColumnInfo`. Catalog statements
//! project fixed aliases, so mapping never depends on the engine.

use crate::db::executor::{deadline_from_secs, with_deadline};
use crate::db::pool::Connection;
use crate::dialect::dialect_named;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnInfo, DEFAULT_QUERY_TIMEOUT_SECS, NULLABLE_NO, NULLABLE_YES, Row, Stage, TableDetail,
    TableInfo,
};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Introspector {
    deadline: Option<Duration>,
}

impl Introspector {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_QUERY_TIMEOUT_SECS)
    }

    /// Deadline per round-trip in seconds; `0` disables it.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            deadline: deadline_from_secs(timeout_secs),
        }
    }

    /// List every table in the connection's database or schema.
    ///
    /// An empty database yields an empty list.
    pub async fn list_tables<C: Connection>(&self, conn: &C) -> DbResult<Vec<TableInfo>> {
        let dialect = dialect_named(conn.engine_name())?;
        let rows = self
            .round_trip(conn, Stage::ListTables, dialect.list_tables(), &[])
            .await?;

        rows.iter()
            .map(|row| table_info_from_row(row, Stage::ListTables))
            .collect()
    }

    /// Describe one table: its info, then its columns in ordinal order.
    ///
    /// A table that does not exist yields empty info fields and no columns.
    pub async fn describe_table<C: Connection>(
        &self,
        conn: &C,
        table_name: &str,
    ) -> DbResult<TableDetail> {
        let dialect = dialect_named(conn.engine_name())?;

        let info_rows = self
            .round_trip(conn, Stage::TableInfo, dialect.table_info(), &[table_name])
            .await?;
        let info = match info_rows.first() {
            Some(row) => table_info_from_row(row, Stage::TableInfo)?,
            None => TableInfo::default(),
        };

        let column_rows = self
            .round_trip(conn, Stage::ColumnsOf, dialect.columns_of(), &[table_name])
            .await?;
        let columns = column_rows
            .iter()
            .map(column_info_from_row)
            .collect::<DbResult<Vec<_>>>()?;

        if info.table_name.is_empty() && columns.is_empty() {
            debug!(table = %table_name, "Table not found");
        }

        Ok(TableDetail { info, columns })
    }

    async fn round_trip<C: Connection>(
        &self,
        conn: &C,
        stage: Stage,
        sql: &str,
        params: &[&str],
    ) -> DbResult<Vec<Row>> {
        debug!(engine = conn.engine_name(), stage = %stage, "Running catalog query");

        let rows = with_deadline(self.deadline, stage, conn.fetch_rows(sql, params))
            .await
            .map_err(|e| e.at_stage(stage))?;

        debug!(stage = %stage, rows = rows.len(), "Catalog query finished");
        Ok(rows)
    }
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn table_info_from_row(row: &Row, stage: Stage) -> DbResult<TableInfo> {
    Ok(TableInfo {
        table_name: text_field(row, "table_name", stage)?,
        table_comment: text_field(row, "table_comment", stage)?,
    })
}

fn column_info_from_row(row: &Row) -> DbResult<ColumnInfo> {
    let stage = Stage::ColumnsOf;
    let column_name = text_field(row, "column_name", stage)?;
    let is_nullable = normalize_nullable(field(row, "is_nullable", stage)?).ok_or_else(|| {
        DbError::query(
            stage,
            format!("Unrecognized nullability for column '{}'", column_name),
        )
    })?;

    Ok(ColumnInfo {
        column_type: text_field(row, "column_type", stage)?,
        column_comment: text_field(row, "column_comment", stage)?,
        is_nullable: is_nullable.to_string(),
        column_default: optional_text(field(row, "column_default", stage)?),
        column_name,
    })
}

/// Look up an alias, tolerating engines that change its case.
fn field<'a>(row: &'a Row, name: &str, stage: Stage) -> DbResult<&'a JsonValue> {
    row.get(name)
        .or_else(|| {
            row.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
        .ok_or_else(|| {
            DbError::query(stage, format!("Catalog result is missing column '{}'", name))
        })
}

/// NULL becomes an empty string.
fn text_field(row: &Row, name: &str, stage: Stage) -> DbResult<String> {
    Ok(optional_text(field(row, name, stage)?).unwrap_or_default())
}

fn optional_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map the many spellings engines use for nullability onto "YES" / "NO".
pub fn normalize_nullable(value: &JsonValue) -> Option<&'static str> {
    match value {
        JsonValue::Bool(true) => Some(NULLABLE_YES),
        JsonValue::Bool(false) => Some(NULLABLE_NO),
        JsonValue::Number(n) => match n.as_i64() {
            Some(0) => Some(NULLABLE_NO),
            Some(_) => Some(NULLABLE_YES),
            None => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "YES" | "Y" | "TRUE" | "1" => Some(NULLABLE_YES),
            "NO" | "N" | "FALSE" | "0" => Some(NULLABLE_NO),
            _ => None,
        },
        _ => None,
    }
}
