//! The local SQLite metadata database.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
/// Settings writes fan out one request per key; they all queue behind the
/// single WAL writer anyway.
const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Where a [`Database`] keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    /// An existing file, opened without creating, migrating or writing it.
    ReadOnly(PathBuf),
    /// Gone when the pool closes. Limited to one connection, since every
    /// connection to `:memory:` opens a database of its own.
    Memory,
}

impl Location {
    fn options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .pragma("temp_store", Cow::Borrowed("MEMORY"));
        match self {
            Self::File(path) => options.filename(path).create_if_missing(true).journal_mode(SqliteJournalMode::Wal),
            Self::ReadOnly(path) => options.filename(path).read_only(true),
            Self::Memory => options.filename(":memory:"),
        }
    }

    fn pool_size(&self) -> u32 {
        match self {
            Self::File(_) | Self::ReadOnly(_) => POOL_SIZE,
            Self::Memory => 1,
        }
    }
}

/// Connection pool over the metadata database, migrated on open.
///
/// Backs [`SqliteStore`](crate::SqliteStore) when the client runs without a
/// server, and in tests.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[instrument(skip_all, fields(location = ?location))]
    pub async fn open(location: Location) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(location.pool_size())
            .connect_with(location.options())
            .await
            .or_raise(|| ErrorKind::Database)?;
        if !matches!(location, Location::ReadOnly(_)) {
            MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        }
        tracing::debug!("metadata database ready");
        Ok(Self { pool })
    }

    /// Open (creating if needed) the database file at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Location::File(path.as_ref().to_path_buf())).await
    }

    /// Open a fresh in-memory database. Available outside tests so other
    /// crates can use it in theirs.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Location::Memory).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored metadata entries across all holders.
    pub async fn entry_count(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM meta").fetch_one(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(count)
    }

    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
