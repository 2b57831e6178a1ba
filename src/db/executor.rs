//! Query execution engine.
//!
//! Runs caller-supplied SQL verbatim against the live connection and returns
//! the uniform `QueryOutcome`. No validation, rewriting or retry happens here;
//! the statement runs with whatever privileges the connection has.
//!
//! Every round-trip is bounded by the configured deadline. On expiry the
//! in-flight future is dropped and `Timeout` is reported.

use crate::db::pool::Connection;
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_QUERY_TIMEOUT_SECS, QueryOutcome, Stage};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles raw SQL execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    default_timeout: Option<Duration>,
}

impl QueryExecutor {
    /// Create a new query executor with the default deadline.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_QUERY_TIMEOUT_SECS)
    }

    /// Create a query executor with a deadline in seconds; `0` disables it.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            default_timeout: deadline_from_secs(timeout_secs),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Execute SQL text and return its rows or affected-row summary.
    pub async fn execute<C: Connection>(&self, conn: &C, sql: &str) -> DbResult<QueryOutcome> {
        let start = Instant::now();

        debug!(
            engine = conn.engine_name(),
            sql = %sql,
            timeout_secs = ?self.default_timeout.map(|t| t.as_secs()),
            "Executing SQL"
        );

        let outcome = with_deadline(self.default_timeout, Stage::Execute, conn.execute(sql))
            .await
            .map_err(|e| e.at_stage(Stage::Execute))?;

        debug!(
            rows = outcome.rows().len(),
            rows_affected = ?outcome.rows_affected(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "SQL executed"
        );

        Ok(outcome)
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// `0` means no deadline.
pub fn deadline_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Await `fut`, failing with `Timeout` if the deadline passes first.
pub(crate) async fn with_deadline<T, F>(
    deadline: Option<Duration>,
    stage: Stage,
    fut: F,
) -> DbResult<T>
where
    F: Future<Output = DbResult<T>>,
{
    let Some(limit) = deadline else {
        return fut.await;
    };

    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(stage = %stage, timeout_secs = limit.as_secs(), "Statement exceeded deadline");
            Err(timeout_error(stage, limit))
        }
    }
}

fn timeout_error(stage: Stage, limit: Duration) -> DbError {
    DbError::timeout(stage.as_str(), limit.as_secs())
}
