//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Session management for every supported engine
//! - Schema introspection driven by the dialect catalog
//! - Raw query execution
//! - Type mappings into portable JSON values
//! - Engine dispatch macro for reducing code duplication

pub mod clickhouse;
pub mod executor;
pub mod introspector;
#[macro_use]
pub mod macros;
pub mod pool;
pub mod sqlserver;
pub mod types;

pub use clickhouse::ClickHouseClient;
pub use executor::QueryExecutor;
pub use introspector::Introspector;
pub use pool::{Connection, DbPool};
pub use sqlserver::SqlServerClient;
