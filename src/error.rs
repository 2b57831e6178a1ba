//! Error types for the database MCP server.
//!
//! All failures are expressed as a single `thiserror` enum. Each variant keeps
//! the engine's own message verbatim so callers can act on it; nothing here is
//! retried or downgraded.

use crate::models::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unsupported database dialect: '{engine}' (expected mysql, postgres, sqlite, sqlserver or clickhouse)")]
    UnsupportedDialect { engine: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Query failed during {stage}: {message}")]
    Query {
        stage: Stage,
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Cannot serialize value of column '{column}' (type {type_name})")]
    Serialization { column: String, type_name: String },

    #[error("Invalid argument: {message}")]
    BadArgument { message: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Capability disabled: {capability}")]
    CapabilityDisabled { capability: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an unsupported dialect error.
    pub fn unsupported_dialect(engine: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            engine: engine.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query error for the given stage.
    pub fn query(stage: Stage, message: impl Into<String>) -> Self {
        Self::Query {
            stage,
            message: message.into(),
            sql_state: None,
        }
    }

    /// Create a serialization error for a column whose value has no portable form.
    pub fn serialization(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::Serialization {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::BadArgument {
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    pub fn capability_disabled(capability: impl Into<String>) -> Self {
        Self::CapabilityDisabled {
            capability: capability.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Re-tag a query error with the stage it actually happened in.
    ///
    /// Connection-level code does not know which introspection step it serves,
    /// so it reports `Stage::Execute`; the caller narrows it here.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Self::Query {
                message, sql_state, ..
            } => Self::Query {
                stage,
                message,
                sql_state,
            },
            other => other,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::UnsupportedDialect { .. } => {
                Some("Set the database type to one of: mysql, postgres, sqlite, sqlserver, clickhouse")
            }
            Self::BadArgument { .. } => Some("Check the tool's input schema from tools/list"),
            Self::Timeout { .. } => Some("Simplify the query or raise --query-timeout"),
            _ => None,
        }
    }

    /// True for failures a caller sees as a query failure.
    pub fn is_query_failure(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Serialization { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::Database(db_err) => DbError::Query {
                stage: Stage::Execute,
                message: db_err.message().to_string(),
                sql_state: db_err.code().map(|c| c.to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::timeout(
                "connection pool acquire",
                crate::db::pool::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::serialization(index, source.to_string())
            }
            sqlx::Error::Decode(source) => DbError::query(Stage::Execute, source.to_string()),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            other => DbError::query(Stage::Execute, other.to_string()),
        }
    }
}

/// Convert SQL Server (TDS) errors to DbError.
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Server(token) => DbError::Query {
                stage: Stage::Execute,
                message: token.message().to_string(),
                sql_state: Some(token.code().to_string()),
            },
            tiberius::error::Error::Io { kind, message } => DbError::connection(
                format!("I/O error ({:?}): {}", kind, message),
                "Check network connectivity and SQL Server status",
            ),
            tiberius::error::Error::Tls(message) => DbError::connection(
                format!("TLS error: {}", message),
                "Verify TLS configuration or the server certificate",
            ),
            tiberius::error::Error::Routing { host, port } => DbError::connection(
                format!("Server requested routing to {}:{}", host, port),
                "Connect to the routed host directly",
            ),
            tiberius::error::Error::Conversion(message) => {
                DbError::serialization("<unknown>", message.to_string())
            }
            other => DbError::query(Stage::Execute, other.to_string()),
        }
    }
}

/// Convert ClickHouse HTTP client errors to DbError.
impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            return DbError::connection(
                format!("Failed to reach ClickHouse: {}", err),
                "Check that the ClickHouse HTTP interface is running and accessible",
            );
        }
        DbError::query(Stage::Execute, err.to_string())
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_unsupported_dialect_names_engine() {
        let err = DbError::unsupported_dialect("oracle");
        assert!(err.to_string().contains("'oracle'"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_query_error_names_stage() {
        let err = DbError::query(Stage::ColumnsOf, "no such table: t");
        assert_eq!(
            err.to_string(),
            "Query failed during columnsOf: no such table: t"
        );
    }

    #[test]
    fn test_at_stage_retags_query_errors_only() {
        let err = DbError::query(Stage::Execute, "boom").at_stage(Stage::TableInfo);
        assert!(matches!(
            err,
            DbError::Query {
                stage: Stage::TableInfo,
                ..
            }
        ));

        let err = DbError::timeout("query", 5).at_stage(Stage::TableInfo);
        assert!(matches!(err, DbError::Timeout { .. }));
    }

    #[test]
    fn test_serialization_is_query_failure() {
        assert!(DbError::serialization("geom", "GEOMETRY").is_query_failure());
        assert!(DbError::query(Stage::Execute, "x").is_query_failure());
        assert!(!DbError::bad_argument("x").is_query_failure());
    }

    #[test]
    fn test_pool_timeout_reports_acquire_timeout() {
        match DbError::from(sqlx::Error::PoolTimedOut) {
            DbError::Timeout {
                operation,
                elapsed_secs,
            } => {
                assert_eq!(operation, "connection pool acquire");
                assert_eq!(elapsed_secs, crate::db::pool::DEFAULT_ACQUIRE_TIMEOUT_SECS);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::connection("refused", "Check the server");
        assert_eq!(err.suggestion(), Some("Check the server"));
        assert_eq!(DbError::internal("x").suggestion(), None);
    }
}
