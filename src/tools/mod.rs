//! MCP tool implementations.
//!
//! This module contains the database tools:
//! - `get_tables`: List tables with their comments
//! - `get_table_detail`: Describe a table's columns
//! - `execute_sql`: Run SQL text verbatim (can be disabled)

pub mod adapter;
pub mod schema;
pub mod sql;

pub use adapter::{EXECUTE_SQL, GET_TABLE_DETAIL, GET_TABLES, ToolAdapter};
pub use schema::{ExecuteSqlInput, GetTableDetailInput, GetTablesInput};
pub use sql::RawSqlCapability;
