use async_trait::async_trait;
use blink_core::repository::{ReadRepository, Repository, Result};
use blink_core::{Clock, ShortCode, StorageError, SystemClock, UrlMapping};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

/// Schema for the `short_urls` table. Safe to run repeatedly.
pub const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

/// MySQL implementation of the repository contract.
///
/// Timestamps are stored as unix milliseconds. Reads only return rows with
/// `expire_at` after the clock's current time; expired rows linger until
/// [`purge_expired`](Repository::purge_expired) deletes them through the
/// `expire_at` index. Code uniqueness is enforced by the unique key on
/// `short_code`.
#[derive(Debug, Clone)]
pub struct MySqlRepository<C = SystemClock> {
    pool: MySqlPool,
    clock: C,
}

impl MySqlRepository<SystemClock> {
    /// Creates a repository from an existing MySQL connection pool.
    ///
    /// The schema is assumed to exist; see [`MySqlRepository::ensure_schema`].
    pub fn new(pool: MySqlPool) -> Self {
        Self::with_clock(pool, SystemClock)
    }

    /// Opens a connection pool and creates the schema if it is missing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        let repository = Self::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }
}

impl<C: Clock> MySqlRepository<C> {
    /// Creates a repository that evaluates expiry against `clock`.
    pub fn with_clock(pool: MySqlPool, clock: C) -> Self {
        Self { pool, clock }
    }

    /// Creates the `short_urls` table and its indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().as_millisecond()
    }
}

fn parse_timestamp(column: &str, millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{millis}': {e}"))
    })
}

fn row_to_mapping(row: &MySqlRow) -> Result<UrlMapping> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expire_at: i64 = row.try_get("expire_at").map_err(map_sqlx_error)?;

    Ok(UrlMapping {
        short_code: ShortCode::new_unchecked(short_code),
        original_url,
        created_at: parse_timestamp("created_at", created_at)?,
        expire_at: parse_timestamp("expire_at", expire_at)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl<C: Clock> ReadRepository for MySqlRepository<C> {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, original_url, created_at, expire_at
            FROM short_urls
            WHERE short_code = ?
              AND expire_at > ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .bind(self.now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, original_url, created_at, expire_at
            FROM short_urls
            WHERE original_url = ?
              AND expire_at > ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .bind(self.now_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }
}

#[async_trait]
impl<C: Clock> Repository for MySqlRepository<C> {
    async fn save(&self, mapping: UrlMapping) -> Result<()> {
        // An expired row still holds the unique key; free it first.
        let freed = sqlx::query(
            r#"
            DELETE FROM short_urls
            WHERE short_code = ?
              AND expire_at <= ?
            "#,
        )
        .bind(mapping.short_code.as_str())
        .bind(self.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if freed.rows_affected() > 0 {
            debug!(code = %mapping.short_code, "reclaimed expired short code");
        }

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, created_at, expire_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(mapping.short_code.as_str())
        .bind(&mapping.original_url)
        .bind(mapping.created_at.as_millisecond())
        .bind(mapping.expire_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(mapping.short_code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM short_urls
            WHERE expire_at <= ?
            "#,
        )
        .bind(self.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
