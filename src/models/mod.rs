//! Data models for the database MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionSettings, EngineKind};
pub use query::{DEFAULT_QUERY_TIMEOUT_SECS, QueryOutcome, Row, Stage};
pub use schema::{ColumnInfo, NULLABLE_NO, NULLABLE_YES, TableDetail, TableInfo};
