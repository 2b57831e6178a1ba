//! Connection-related data models.
//!
//! This module defines the supported engine kinds and the settings used to
//! open a session against one of them.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Includes MariaDB
    MySql,
    Postgres,
    SQLite,
    /// Microsoft SQL Server
    SqlServer,
    ClickHouse,
}

impl EngineKind {
    pub const ALL: [EngineKind; 5] = [
        Self::MySql,
        Self::Postgres,
        Self::SQLite,
        Self::SqlServer,
        Self::ClickHouse,
    ];

    /// Canonical lowercase name, as accepted by `--db-type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::SQLite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::ClickHouse => "clickhouse",
        }
    }

    /// Get the display name for this engine.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::SQLite => "SQLite",
            Self::SqlServer => "SQL Server",
            Self::ClickHouse => "ClickHouse",
        }
    }

    /// Get the default port for this engine.
    ///
    /// ClickHouse is reached through its HTTP interface, hence 8123.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::SQLite => None,
            Self::SqlServer => Some(1433),
            Self::ClickHouse => Some(8123),
        }
    }
}

impl FromStr for EngineKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "clickhouse" => Ok(Self::ClickHouse),
            _ => Err(DbError::unsupported_dialect(s)),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Everything needed to open a session, assembled once at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub engine: EngineKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Sensitive - never logged
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    /// PostgreSQL only: disable, allow, prefer, require, verify-ca, verify-full
    pub ssl_mode: String,
    /// SQLite only: path to the database file
    pub file: String,
}

impl ConnectionSettings {
    /// Validate the settings for the chosen engine.
    pub fn validate(&self) -> DbResult<()> {
        match self.engine {
            EngineKind::SQLite => {
                if self.file.trim().is_empty() {
                    return Err(DbError::config("SQLite requires a database file path"));
                }
            }
            _ => {
                if self.host.trim().is_empty() {
                    return Err(DbError::config(format!(
                        "{} requires a host",
                        self.engine.display_name()
                    )));
                }
                if self.port == 0 {
                    return Err(DbError::config("port must be greater than 0"));
                }
            }
        }
        Ok(())
    }

    /// Human-readable target for logs (no credentials).
    pub fn target(&self) -> String {
        match self.engine {
            EngineKind::SQLite => self.file.clone(),
            _ => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("file", &self.file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(engine: EngineKind) -> ConnectionSettings {
        ConnectionSettings {
            engine,
            host: "localhost".to_string(),
            port: engine.default_port().unwrap_or(0),
            username: "root".to_string(),
            password: "hunter2".to_string(),
            database: "mydb".to_string(),
            ssl_mode: "disable".to_string(),
            file: String::new(),
        }
    }

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("mysql".parse::<EngineKind>().unwrap(), EngineKind::MySql);
        assert_eq!(
            "PostgreSQL".parse::<EngineKind>().unwrap(),
            EngineKind::Postgres
        );
        assert_eq!("sqlite".parse::<EngineKind>().unwrap(), EngineKind::SQLite);
        assert_eq!("mssql".parse::<EngineKind>().unwrap(), EngineKind::SqlServer);
        assert_eq!(
            " clickhouse ".parse::<EngineKind>().unwrap(),
            EngineKind::ClickHouse
        );
    }

    #[test]
    fn test_engine_kind_rejects_unknown() {
        let err = "oracle".parse::<EngineKind>().unwrap_err();
        assert!(matches!(err, DbError::UnsupportedDialect { ref engine } if engine == "oracle"));
    }

    #[test]
    fn test_engine_kind_round_trips_canonical_name() {
        for engine in EngineKind::ALL {
            assert_eq!(engine.as_str().parse::<EngineKind>().unwrap(), engine);
        }
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(EngineKind::MySql.default_port(), Some(3306));
        assert_eq!(EngineKind::Postgres.default_port(), Some(5432));
        assert_eq!(EngineKind::SQLite.default_port(), None);
        assert_eq!(EngineKind::SqlServer.default_port(), Some(1433));
        assert_eq!(EngineKind::ClickHouse.default_port(), Some(8123));
    }

    #[test]
    fn test_sqlite_requires_file() {
        let s = settings(EngineKind::SQLite);
        assert!(matches!(s.validate(), Err(DbError::Config { .. })));

        let s = ConnectionSettings {
            file: "data.db".to_string(),
            ..settings(EngineKind::SQLite)
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_server_engines_require_host() {
        let s = ConnectionSettings {
            host: String::new(),
            ..settings(EngineKind::Postgres)
        };
        assert!(s.validate().is_err());
        assert!(settings(EngineKind::Postgres).validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_password() {
        let s = settings(EngineKind::MySql);
        let debug = format!("{:?}", s);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_target_has_no_credentials() {
        let s = settings(EngineKind::MySql);
        assert_eq!(s.target(), "localhost:3306/mydb");
    }
}
