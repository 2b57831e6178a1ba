//! SQL Server client over TDS.
//!
//! One session is kept per server process and guarded by an async mutex. The
//! session is taken out of the slot for the duration of a statement and only
//! put back when the statement ran to completion, so a statement cancelled
//! by its deadline (or broken by an I/O error) leaves the slot empty and the
//! next call reconnects.

use crate::db::types::{decode_binary_value, float_value};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionSettings, QueryOutcome, Row};
use serde_json::Value as JsonValue;
use std::fmt;
use tiberius::time::chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, ToSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

type Session = Client<Compat<TcpStream>>;

pub struct SqlServerClient {
    config: Config,
    target: String,
    session: Mutex<Option<Session>>,
}

impl fmt::Debug for SqlServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlServerClient")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl SqlServerClient {
    /// Open the session eagerly so bad credentials fail at startup.
    pub async fn connect(settings: &ConnectionSettings) -> DbResult<Self> {
        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        if !settings.database.is_empty() {
            config.database(&settings.database);
        }
        config.authentication(AuthMethod::sql_server(
            &settings.username,
            &settings.password,
        ));
        config.trust_cert();

        let session = open(&config).await?;
        Ok(Self {
            config,
            target: settings.target(),
            session: Mutex::new(Some(session)),
        })
    }

    /// Run a parameterized query and return its first result set.
    pub async fn fetch_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let mut slot = self.session.lock().await;
        let mut session = self.checkout(&mut slot).await?;

        let result = async {
            let bound: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
            let rows = session.query(sql, &bound).await?.into_first_result().await?;
            rows.iter().map(row_to_json).collect::<DbResult<Vec<Row>>>()
        }
        .await;

        checkin(&mut slot, session, &result);
        result
    }

    /// Run a batch verbatim and return the rows of every result set in order.
    ///
    /// TDS row counts are not surfaced by the client, so a batch without any
    /// result set reports an empty row set.
    pub async fn execute(&self, sql: &str) -> DbResult<QueryOutcome> {
        let mut slot = self.session.lock().await;
        let mut session = self.checkout(&mut slot).await?;

        let result = async {
            let sets = session.simple_query(sql).await?.into_results().await?;
            let mut rows = Vec::new();
            for row in sets.iter().flatten() {
                rows.push(row_to_json(row)?);
            }
            Ok::<_, DbError>(QueryOutcome::Rows(rows))
        }
        .await;

        checkin(&mut slot, session, &result);
        result
    }

    /// Close the session, if one is open.
    pub async fn close(&self) {
        if let Some(session) = self.session.lock().await.take() {
            if let Err(e) = session.close().await {
                debug!(error = %e, "Error while closing SQL Server session");
            }
        }
    }

    async fn checkout(&self, slot: &mut Option<Session>) -> DbResult<Session> {
        match slot.take() {
            Some(session) => Ok(session),
            None => {
                info!(target = %self.target, "Reopening SQL Server session");
                open(&self.config).await
            }
        }
    }
}

/// Return the session to the slot unless it failed at the connection level.
fn checkin<T>(slot: &mut Option<Session>, session: Session, result: &DbResult<T>) {
    if !matches!(result, Err(DbError::Connection { .. })) {
        *slot = Some(session);
    }
}

async fn open(config: &Config) -> DbResult<Session> {
    let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
        DbError::connection(
            format!("Failed to reach SQL Server at {}: {}", config.get_addr(), e),
            "Check that SQL Server is running and accepting TCP connections",
        )
    })?;
    tcp.set_nodelay(true).map_err(|e| {
        DbError::connection(
            format!("Failed to configure socket: {}", e),
            "Check network configuration",
        )
    })?;

    Ok(Client::connect(config.clone(), tcp.compat_write()).await?)
}

fn row_to_json(row: &tiberius::Row) -> DbResult<Row> {
    let mut map = Row::new();
    for (column, data) in row.cells() {
        map.insert(column.name().to_string(), cell_value(column.name(), data)?);
    }
    Ok(map)
}

fn cell_value(column: &str, data: &ColumnData<'static>) -> DbResult<JsonValue> {
    let value = match data {
        ColumnData::U8(v) => v.map(JsonValue::from),
        ColumnData::I16(v) => v.map(JsonValue::from),
        ColumnData::I32(v) => v.map(JsonValue::from),
        ColumnData::I64(v) => v.map(JsonValue::from),
        ColumnData::F32(v) => v.map(|v| float_value(v as f64)),
        ColumnData::F64(v) => v.map(float_value),
        ColumnData::Bit(v) => v.map(JsonValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| JsonValue::String(s.to_string())),
        ColumnData::Guid(v) => v.as_ref().map(|g| JsonValue::String(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| decode_binary_value(b)),
        ColumnData::Numeric(v) => v.as_ref().map(|n| JsonValue::String(n.to_string())),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| JsonValue::String((**x).clone().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map(|v| JsonValue::String(v.to_string()))
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?.map(|v| JsonValue::String(v.to_string())),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?.map(|v| JsonValue::String(v.to_string())),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)?
            .map(|v| JsonValue::String(v.to_rfc3339())),
        #[allow(unreachable_patterns)]
        _ => return Err(DbError::serialization(column, "unsupported TDS type")),
    };
    Ok(value.unwrap_or(JsonValue::Null))
}
