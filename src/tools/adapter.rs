//! Named-operation dispatch.
//!
//! `ToolAdapter` receives a tool name plus its JSON arguments, decodes the
//! arguments into the tool's typed input, runs it against the shared
//! connection and returns the result as JSON text.

use crate::db::{Connection, DbPool, Introspector, QueryExecutor};
use crate::dialect::dialect_named;
use crate::error::{DbError, DbResult};
use crate::tools::schema::{ExecuteSqlInput, GetTableDetailInput, GetTablesInput};
use crate::tools::sql::RawSqlCapability;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const GET_TABLES: &str = "get_tables";
pub const GET_TABLE_DETAIL: &str = "get_table_detail";
pub const EXECUTE_SQL: &str = "execute_sql";

pub const GET_TABLES_DESCRIPTION: &str = "List all tables in the connected database.\nReturns table names with their comments (empty when the engine has none).";
pub const GET_TABLE_DETAIL_DESCRIPTION: &str = "Get the columns of a table.\nReturns the table comment and, per column in definition order: name, type, comment, nullability (YES/NO) and default.\nAn unknown table yields empty fields and no columns.";
pub const EXECUTE_SQL_DESCRIPTION: &str = "Execute a SQL statement verbatim.\nReturns an array of row objects, or {\"rows_affected\": n} for statements that only modify data.\nSECURITY: the statement is not inspected or restricted. Destructive statements (DROP, DELETE, UPDATE, TRUNCATE) run unchecked with the privileges of the configured database user; start the server with --disable-execute-sql to remove this tool.";

pub struct ToolAdapter<C: Connection = DbPool> {
    conn: Arc<C>,
    introspector: Introspector,
    executor: QueryExecutor,
    raw_sql: RawSqlCapability,
}

impl<C: Connection> ToolAdapter<C> {
    /// Create an adapter with the default query deadline and `execute_sql` enabled.
    pub fn new(conn: Arc<C>) -> Self {
        Self {
            conn,
            introspector: Introspector::new(),
            executor: QueryExecutor::new(),
            raw_sql: RawSqlCapability::Enabled,
        }
    }

    /// Bound every database round-trip to `timeout_secs`; `0` disables the deadline.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.introspector = Introspector::with_timeout(timeout_secs);
        self.executor = QueryExecutor::with_timeout(timeout_secs);
        self
    }

    pub fn with_raw_sql(mut self, raw_sql: RawSqlCapability) -> Self {
        self.raw_sql = raw_sql;
        self
    }

    pub fn raw_sql(&self) -> RawSqlCapability {
        self.raw_sql
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    /// Names of the tools this adapter will accept, in listing order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        let mut names = vec![GET_TABLES, GET_TABLE_DETAIL];
        if self.raw_sql.is_enabled() {
            names.push(EXECUTE_SQL);
        }
        names
    }

    /// Run the named tool and return its result serialized as JSON text.
    pub async fn invoke(&self, name: &str, arguments: Option<Map<String, JsonValue>>) -> DbResult<String> {
        if !self.tool_names().contains(&name) {
            return Err(match name {
                EXECUTE_SQL => DbError::capability_disabled(EXECUTE_SQL),
                _ => DbError::unknown_tool(name),
            });
        }

        // Reject an unusable engine before any connection I/O.
        dialect_named(self.conn.engine_name())?;

        let start = Instant::now();
        let json = match name {
            GET_TABLES => {
                let _input: GetTablesInput = decode(arguments)?;
                let tables = self.introspector.list_tables(self.conn.as_ref()).await?;
                info!(count = tables.len(), "Listed tables");
                to_json(&tables)?
            }
            GET_TABLE_DETAIL => {
                let input: GetTableDetailInput = decode(arguments)?;
                let detail = self
                    .introspector
                    .describe_table(self.conn.as_ref(), &input.table_name)
                    .await?;
                info!(
                    table = %input.table_name,
                    columns = detail.columns.len(),
                    "Described table"
                );
                to_json(&detail)?
            }
            _ => {
                let input: ExecuteSqlInput = decode(arguments)?;
                let outcome = self.executor.execute(self.conn.as_ref(), &input.query).await?;
                info!(
                    rows = outcome.rows().len(),
                    rows_affected = ?outcome.rows_affected(),
                    "Executed SQL"
                );
                to_json(&outcome)?
            }
        };

        info!(
            tool = name,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Tool call completed"
        );
        Ok(json)
    }
}

fn decode<T: DeserializeOwned>(arguments: Option<Map<String, JsonValue>>) -> DbResult<T> {
    let value = JsonValue::Object(arguments.unwrap_or_default());
    serde_json::from_value(value).map_err(|e| DbError::bad_argument(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string(value)
        .map_err(|e| DbError::internal(format!("Failed to serialize result: {}", e)))
}
