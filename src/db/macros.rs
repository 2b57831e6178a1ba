//! Engine dispatch macro.
//!
//! Expands to a `match` over `DbPool` variants so per-engine code stays in
//! parallel modules while call sites read linearly.

/// Macro for generating `DbPool` dispatch match arms.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => mysql::execute(p, sql).await,
///     Postgres(p) => postgres::execute(p, sql).await,
///     SQLite(p) => sqlite::execute(p, sql).await,
///     SqlServer(c) => c.execute(sql).await,
///     ClickHouse(c) => c.execute(sql).await,
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
