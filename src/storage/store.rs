//! Stats Store - pooled access to the SQLite `stats` relation
//!
//! Every operation checks a connection out of the pool, runs one statement
//! (or one transaction) on the pool's blocking thread, and hands the
//! connection back as soon as the rows are consumed.

use crate::query::{Dialect, RenderedQuery, SqlParam, SqliteDialect};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{StatsRow, TIMESTAMP_FORMAT};
use deadpool_sqlite::{Config as PoolSettings, Pool, PoolConfig, Runtime};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, params_from_iter, Row, ToSql};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA temp_store = MEMORY;

    CREATE TABLE IF NOT EXISTS stats (
        changeset_id        INTEGER NOT NULL,
        user_id             INTEGER NOT NULL,
        road_length         REAL,
        building_area       REAL,
        hashtag             TEXT NOT NULL,
        changeset_timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_stats_hashtag_time
        ON stats(hashtag, changeset_timestamp);

    CREATE INDEX IF NOT EXISTS idx_stats_time
        ON stats(changeset_timestamp);
";

const INSERT_ROW: &str = "INSERT INTO stats
    (changeset_id, user_id, road_length, building_area, hashtag, changeset_timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Text(s) => s.to_sql(),
            SqlParam::Integer(n) => n.to_sql(),
            SqlParam::Timestamp(ts) => Ok(ToSqlOutput::from(ts.format(TIMESTAMP_FORMAT).to_string())),
        }
    }
}

/// Pooled handle to the statistics database
#[derive(Clone)]
pub struct StatsStore {
    pool: Pool,
    path: PathBuf,
    dialect: SqliteDialect,
}

impl StatsStore {
    /// Open (or create) the database and make sure the schema exists
    pub async fn open(path: impl AsRef<Path>, pool_size: usize) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut settings = PoolSettings::new(&path);
        settings.pool = Some(PoolConfig::new(pool_size.max(1)));

        let pool = settings
            .create_pool(Runtime::Tokio1)
            .map_err(|e| StorageError::Pool(e.to_string()))?;

        let store = Self {
            pool,
            path,
            dialect: SqliteDialect,
        };
        store.initialize_schema().await?;

        tracing::info!(path = ?store.path, pool_size, "Stats store opened");
        Ok(store)
    }

    async fn initialize_schema(&self) -> StorageResult<()> {
        let conn = self.pool.get().await?;
        conn.interact(|conn| conn.execute_batch(SCHEMA)).await??;
        Ok(())
    }

    /// Dialect the store executes
    pub fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a rendered query and map every row
    pub async fn fetch_all<T, F>(&self, query: RenderedQuery, map_row: F) -> StorageResult<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Executing stats query");

        let conn = self.pool.get().await?;
        let rows = conn
            .interact(move |conn| {
                let mut stmt = conn.prepare_cached(&query.sql)?;
                let mapped = stmt.query_map(params_from_iter(query.params.iter()), |row| {
                    map_row(row)
                })?;
                let collected = mapped.collect::<rusqlite::Result<Vec<T>>>();
                collected
            })
            .await??;

        Ok(rows)
    }

    /// Run a rendered query that yields exactly one row
    pub async fn fetch_one<T, F>(&self, query: RenderedQuery, map_row: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        self.fetch_all(query, map_row)
            .await?
            .into_iter()
            .next()
            .ok_or(StorageError::EmptyResult)
    }

    /// Insert rows in a single transaction
    pub async fn insert_rows(&self, rows: Vec<StatsRow>) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let conn = self.pool.get().await?;
        let inserted = conn
            .interact(move |conn| -> rusqlite::Result<usize> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(INSERT_ROW)?;
                    for row in &rows {
                        stmt.execute(params![
                            row.changeset_id,
                            row.user_id,
                            row.road_length,
                            row.building_area,
                            row.hashtag,
                            row.changeset_timestamp.format(TIMESTAMP_FORMAT).to_string(),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await??;

        tracing::debug!(inserted, "Inserted stats rows");
        Ok(inserted)
    }

    /// Number of rows in the `stats` relation
    pub async fn row_count(&self) -> StorageResult<u64> {
        let conn = self.pool.get().await?;
        let count: i64 = conn
            .interact(|conn| conn.query_row("SELECT COUNT(*) FROM stats", [], |row| row.get(0)))
            .await??;
        Ok(count.max(0) as u64)
    }

    /// Cheap round trip to check the store is reachable
    pub async fn ping(&self) -> StorageResult<()> {
        let conn = self.pool.get().await?;
        conn.interact(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await??;
        Ok(())
    }
}
