//! Session management.
//!
//! `DbPool` owns the single live session of the server process. MySQL,
//! PostgreSQL and SQLite use database-specific sqlx pools (MySqlPool, PgPool,
//! SqlitePool) to keep full type support; SQL Server uses a TDS client and
//! ClickHouse its HTTP interface.

use crate::db::clickhouse::ClickHouseClient;
use crate::db::sqlserver::SqlServerClient;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionSettings, EngineKind, QueryOutcome, Row};
use sqlx::{
    MySqlPool, PgPool, SqlitePool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    postgres::PgConnectOptions, postgres::PgPoolOptions, postgres::PgSslMode,
    sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub(crate) const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// A live session bound to one engine and one database.
///
/// This is the only surface the introspector and executor need, which keeps
/// them testable without a server.
pub trait Connection: Send + Sync {
    /// Engine name, e.g. `"mysql"`. Resolved to a dialect by name.
    fn engine_name(&self) -> &str;

    /// Run a catalog statement, binding `params` in order, and return its rows.
    fn fetch_rows(
        &self,
        sql: &str,
        params: &[&str],
    ) -> impl Future<Output = DbResult<Vec<Row>>> + Send;

    /// Run caller-supplied SQL verbatim.
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<QueryOutcome>> + Send;
}

/// Engine-specific session (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
    SqlServer(Arc<SqlServerClient>),
    ClickHouse(ClickHouseClient),
}

impl DbPool {
    /// Open a session from settings.
    pub async fn connect(settings: &ConnectionSettings) -> DbResult<Self> {
        settings.validate()?;

        info!(
            engine = %settings.engine,
            target = %settings.target(),
            "Connecting to database"
        );

        let acquire_timeout = Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS);
        let pool = match settings.engine {
            EngineKind::MySql => {
                let options = MySqlConnectOptions::new()
                    .host(&settings.host)
                    .port(settings.port)
                    .username(&settings.username)
                    .password(&settings.password)
                    .database(&settings.database)
                    .charset("utf8mb4");

                let pool = MySqlPoolOptions::new()
                    .max_connections(DEFAULT_MAX_CONNECTIONS)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| connect_error(settings.engine, &e))?;
                DbPool::MySql(pool)
            }
            EngineKind::Postgres => {
                let ssl_mode = PgSslMode::from_str(&settings.ssl_mode).map_err(|_| {
                    DbError::config(format!(
                        "Invalid ssl mode '{}' (expected disable, allow, prefer, require, verify-ca or verify-full)",
                        settings.ssl_mode
                    ))
                })?;
                let options = PgConnectOptions::new()
                    .host(&settings.host)
                    .port(settings.port)
                    .username(&settings.username)
                    .password(&settings.password)
                    .database(&settings.database)
                    .ssl_mode(ssl_mode);

                let pool = PgPoolOptions::new()
                    .max_connections(DEFAULT_MAX_CONNECTIONS)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| connect_error(settings.engine, &e))?;
                DbPool::Postgres(pool)
            }
            EngineKind::SQLite => {
                let options = SqliteConnectOptions::new()
                    .filename(&settings.file)
                    .create_if_missing(true);

                // One writer at a time; a single connection avoids SQLITE_BUSY
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| connect_error(settings.engine, &e))?;
                DbPool::SQLite(pool)
            }
            EngineKind::SqlServer => {
                DbPool::SqlServer(Arc::new(SqlServerClient::connect(settings).await?))
            }
            EngineKind::ClickHouse => DbPool::ClickHouse(ClickHouseClient::new(settings)?),
        };

        match pool.server_version().await {
            Some(version) => info!(engine = %settings.engine, version = %version, "Connected successfully"),
            None => info!(engine = %settings.engine, "Connected successfully"),
        }

        Ok(pool)
    }

    /// Close the session.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::SQLite(pool) => pool.close().await,
            DbPool::SqlServer(client) => client.close().await,
            DbPool::ClickHouse(_) => {}
        }
    }

    /// Get the engine for this session.
    pub fn engine(&self) -> EngineKind {
        match self {
            DbPool::MySql(_) => EngineKind::MySql,
            DbPool::Postgres(_) => EngineKind::Postgres,
            DbPool::SQLite(_) => EngineKind::SQLite,
            DbPool::SqlServer(_) => EngineKind::SqlServer,
            DbPool::ClickHouse(_) => EngineKind::ClickHouse,
        }
    }

    /// Get the server version, if the engine reports one.
    pub async fn server_version(&self) -> Option<String> {
        let sql = match self.engine() {
            EngineKind::MySql | EngineKind::Postgres | EngineKind::ClickHouse => {
                "SELECT version() AS version"
            }
            EngineKind::SQLite => "SELECT sqlite_version() AS version",
            EngineKind::SqlServer => "SELECT CAST(SERVERPROPERTY('ProductVersion') AS NVARCHAR(128)) AS version",
        };

        match self.fetch_rows(sql, &[]).await {
            Ok(rows) => {
                let version = rows
                    .first()
                    .and_then(|row| row.get("version"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                debug!(version = ?version, "Got server version");
                version
            }
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }
}

impl Connection for DbPool {
    fn engine_name(&self) -> &str {
        self.engine().as_str()
    }

    async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        impl_db_dispatch!(self, {
            MySql(p) => mysql::fetch_rows(p, sql, params).await,
            Postgres(p) => postgres::fetch_rows(p, sql, params).await,
            SQLite(p) => sqlite::fetch_rows(p, sql, params).await,
            SqlServer(c) => c.fetch_rows(sql, params).await,
            ClickHouse(c) => c.fetch_rows(sql, params).await,
        })
    }

    async fn execute(&self, sql: &str) -> DbResult<QueryOutcome> {
        impl_db_dispatch!(self, {
            MySql(p) => mysql::execute(p, sql).await,
            Postgres(p) => postgres::execute(p, sql).await,
            SQLite(p) => sqlite::execute(p, sql).await,
            SqlServer(c) => c.execute(sql).await,
            ClickHouse(c) => c.execute(sql).await,
        })
    }
}

fn connect_error(engine: EngineKind, error: &sqlx::Error) -> DbError {
    DbError::connection(
        format!("Failed to connect: {}", error),
        connection_suggestion(engine, error),
    )
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(engine: EngineKind, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!("Check that the {} server is running and accessible", engine);
    }

    if error_str.contains("authentication") || error_str.contains("password") {
        return "Verify the username and password".to_string();
    }

    if error_str.contains("does not exist") || error_str.contains("unknown database") {
        return "Check that the database name exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or set --db-ssl-mode disable".to_string();
    }

    match engine {
        EngineKind::SQLite => "Verify the file path exists and is accessible".to_string(),
        _ => format!(
            "Verify --db-host and --db-port point at a {} server",
            engine.display_name()
        ),
    }
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its driver types.
// Catalog statements are prepared with bound parameters; caller SQL runs
// unprepared through `raw_sql` so multi-statement text and statements that
// cannot be prepared are accepted. Row sets and affected counts of every
// statement are collected eagerly.

mod mysql {
    use crate::db::types::RowToJson;
    use crate::error::DbResult;
    use crate::models::{QueryOutcome, Row};
    use futures_util::TryStreamExt;
    use sqlx::{Either, MySqlPool};

    pub async fn fetch_rows(pool: &MySqlPool, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(pool).await?;
        rows.iter().map(RowToJson::to_json_map).collect()
    }

    pub async fn execute(pool: &MySqlPool, sql: &str) -> DbResult<QueryOutcome> {
        let mut stream = sqlx::raw_sql(sql).fetch_many(pool);
        let mut rows = Vec::new();
        let mut rows_affected = 0u64;
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => rows.push(row.to_json_map()?),
            }
        }
        Ok(QueryOutcome::from_parts(rows, rows_affected))
    }
}

mod postgres {
    use crate::db::types::RowToJson;
    use crate::error::DbResult;
    use crate::models::{QueryOutcome, Row};
    use futures_util::TryStreamExt;
    use sqlx::{Either, PgPool};

    pub async fn fetch_rows(pool: &PgPool, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(pool).await?;
        rows.iter().map(RowToJson::to_json_map).collect()
    }

    pub async fn execute(pool: &PgPool, sql: &str) -> DbResult<QueryOutcome> {
        let mut stream = sqlx::raw_sql(sql).fetch_many(pool);
        let mut rows = Vec::new();
        let mut rows_affected = 0u64;
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => rows_affected += done.rows_affected(),
                Either::Right(row) => rows.push(row.to_json_map()?),
            }
        }
        Ok(QueryOutcome::from_parts(rows, rows_affected))
    }
}

mod sqlite {
    use crate::db::types::RowToJson;
    use crate::error::DbResult;
    use crate::models::{QueryOutcome, Row};
    use futures_util::TryStreamExt;
    use sqlx::{Either, SqliteConnection, SqlitePool};

    pub async fn fetch_rows(pool: &SqlitePool, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(pool).await?;
        rows.iter().map(RowToJson::to_json_map).collect()
    }

    /// Affected rows are the `total_changes()` delta on the connection that ran
    /// the batch; `sqlite3_changes()` is not reset by SELECT or DDL.
    pub async fn execute(pool: &SqlitePool, sql: &str) -> DbResult<QueryOutcome> {
        let mut conn = pool.acquire().await?;
        let before = total_changes(&mut conn).await?;

        let mut rows = Vec::new();
        {
            let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);
            while let Some(item) = stream.try_next().await? {
                if let Either::Right(row) = item {
                    rows.push(row.to_json_map()?);
                }
            }
        }

        let after = total_changes(&mut conn).await?;
        let rows_affected = u64::try_from(after - before).unwrap_or_default();
        Ok(QueryOutcome::from_parts(rows, rows_affected))
    }

    async fn total_changes(conn: &mut SqliteConnection) -> DbResult<i64> {
        let changes: i64 = sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&mut *conn)
            .await?;
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sqlite_settings(file: &str) -> ConnectionSettings {
        ConnectionSettings {
            engine: EngineKind::SQLite,
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            ssl_mode: "disable".to_string(),
            file: file.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_connect_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");
        let pool = DbPool::connect(&sqlite_settings(path.to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(pool.engine(), EngineKind::SQLite);
        assert_eq!(pool.engine_name(), "sqlite");
        assert!(path.exists());
        assert!(pool.server_version().await.is_some());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_settings() {
        let result = DbPool::connect(&sqlite_settings("")).await;
        assert!(matches!(result, Err(DbError::Config { .. })));
    }

    #[tokio::test]
    async fn test_postgres_rejects_unknown_ssl_mode() {
        let settings = ConnectionSettings {
            engine: EngineKind::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            ssl_mode: "sometimes".to_string(),
            file: String::new(),
        };
        let result = DbPool::connect(&settings).await;
        assert!(matches!(result, Err(DbError::Config { .. })));
    }

    #[tokio::test]
    async fn test_sqlite_execute_reports_affected_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exec.db");
        let pool = DbPool::connect(&sqlite_settings(path.to_str().unwrap()))
            .await
            .unwrap();

        let created = pool
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        assert_eq!(created, QueryOutcome::Rows(vec![]));

        let inserted = pool
            .execute("INSERT INTO t (name) VALUES ('a'), ('b')")
            .await
            .unwrap();
        assert_eq!(inserted.rows_affected(), Some(2));

        let rows = pool.fetch_rows("SELECT name FROM t WHERE name = ?", &["b"]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "b");
        pool.close().await;
    }
}
