//! Record Store
//!
//! Access to the `record_a` table. The migrator only sees the
//! [`RecordStore`] trait so it can run against MySQL or an in-memory table.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::debug;

use crate::error::MigrateError;
use crate::record::{NewRecord, Record, WILDCARD_LIKE_PATTERN};

/// Operations the migration needs from the records table
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows whose name starts with the escaped wildcard marker
    async fn wildcard_records(&self) -> Result<Vec<Record>, MigrateError>;

    /// The stored `fqdn` of the row named `fqdn`, if any
    async fn find_fqdn(&self, fqdn: &str) -> Result<Option<String>, MigrateError>;

    /// Insert one row as a standalone statement
    async fn insert(&self, record: &NewRecord) -> Result<(), MigrateError>;
}

/// MySQL-backed store
pub struct MySqlRecordStore {
    pool: MySqlPool,
}

impl MySqlRecordStore {
    /// Open a pool; the first connection is established eagerly so a bad DSN
    /// fails here rather than on the first query.
    pub async fn connect(
        options: MySqlConnectOptions,
        max_connections: u32,
    ) -> Result<Self, MigrateError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::database("connect", e))?;

        debug!(max_connections, "MySQL pool opened");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn wildcard_records(&self) -> Result<Vec<Record>, MigrateError> {
        let query = "SELECT id, fqdn, type, content, created_on, updated_on, tid FROM record_a WHERE fqdn LIKE ?";
        sqlx::query_as(query)
            .bind(WILDCARD_LIKE_PATTERN)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrateError::database("select wildcard records", e))
    }

    async fn find_fqdn(&self, fqdn: &str) -> Result<Option<String>, MigrateError> {
        let query = "SELECT fqdn FROM record_a WHERE fqdn = ?";
        sqlx::query_scalar(query)
            .bind(fqdn)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MigrateError::database("look up bare name", e))
    }

    async fn insert(&self, record: &NewRecord) -> Result<(), MigrateError> {
        let query = "INSERT INTO record_a (fqdn, type, content, created_on, tid) VALUES (?, ?, ?, ?, ?)";
        sqlx::query(query)
            .bind(&record.fqdn)
            .bind(record.record_type)
            .bind(&record.content)
            .bind(record.created_on)
            .bind(record.tid)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| MigrateError::database("insert bare record", e))
    }
}
