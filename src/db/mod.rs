use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;

use crate::error::Result;

pub mod summary_store;
pub mod tables;

pub use summary_store::{SummarySink, SummaryStore};

pub type DbPool = Pool<Sqlite>;

/// Open the connection pool for the inventory database.
///
/// The database is never created here; a missing file is a connectivity
/// error for this job.
pub async fn init_db_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    tracing::debug!(database_url, "Connected to inventory database");

    Ok(pool)
}
