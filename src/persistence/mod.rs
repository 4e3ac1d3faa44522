//! Persistence layer: SQLite schema and per-entity repositories.
//!
//! [`Store`] owns the connection pool and is passed explicitly to every
//! consumer; there is no process-wide connection state. Each entity has a
//! lightweight repository borrowed from the store (`store.goals()`,
//! `store.clients()`, ...) exposing `create`, `get`, `list`, `update` and
//! `delete`.
//!
//! Every mutation runs in a single transaction opened with
//! `BEGIN IMMEDIATE` (see `begin_write`), so concurrent writers queue on
//! the busy timeout instead of failing mid-transaction. A transaction that
//! is dropped without `commit` rolls back, so early returns on validation
//! or storage errors never leave partial writes or leak the connection.

pub mod action_items;
pub mod audit_logs;
mod cascade;
pub mod clients;
pub mod goals;
pub mod households;
pub mod interactions;
pub mod managers;
pub mod portfolios;
pub mod positions;
pub mod reports;
mod schema;
pub mod sentiment_logs;

use std::str::FromStr;

use serde::Deserialize;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions,
};
use sqlx::{Sqlite, Transaction};

use crate::config::CrmConfig;
use crate::error::CrmError;

pub use action_items::ActionItems;
pub use audit_logs::AuditLogs;
pub use clients::Clients;
pub use goals::Goals;
pub use households::Households;
pub use interactions::Interactions;
pub use managers::Managers;
pub use portfolios::Portfolios;
pub use positions::Positions;
pub use reports::Reports;
pub use schema::TABLES;
pub use sentiment_logs::SentimentLogs;

/// Prepared list statement with its filter parameters bound.
pub(crate) type ListQuery = Query<'static, Sqlite, SqliteArguments<'static>>;

/// What to do with dependent rows when deleting a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse with [`CrmError::Conflict`] while dependents exist.
    #[default]
    Restrict,
    /// Delete the whole subtree in the same transaction.
    Cascade,
}

/// Handle to the relational store.
///
/// Cheap to clone: clones share the same pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `config.database_url`, creating the database file
    /// if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::StorageUnavailable`] if the URL is invalid or
    /// the database cannot be opened.
    pub async fn connect(config: &CrmConfig) -> Result<Self, CrmError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| CrmError::StorageUnavailable(format!("invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.connect_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await
            .map_err(|e| CrmError::StorageUnavailable(e.to_string()))?;

        tracing::info!(url = %config.database_url, "database pool opened");
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database with the schema installed.
    ///
    /// The pool holds exactly one connection that never expires, since an
    /// in-memory SQLite database lives only as long as its connection.
    ///
    /// # Errors
    ///
    /// Returns a [`CrmError`] if SQLite cannot be opened.
    pub async fn in_memory() -> Result<Self, CrmError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates every table, index and trigger that does not exist yet.
    ///
    /// Idempotent and non-destructive: safe to call on every start.
    ///
    /// # Errors
    ///
    /// Returns a [`CrmError`] if a DDL statement fails.
    pub async fn init_schema(&self) -> Result<(), CrmError> {
        schema::apply(&self.pool).await
    }

    /// Round-trips a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::StorageUnavailable`] if the database does not
    /// answer.
    pub async fn ping(&self) -> Result<(), CrmError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| CrmError::StorageUnavailable(e.to_string()))
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Manager repository.
    #[must_use]
    pub fn managers(&self) -> Managers<'_> {
        Managers::new(&self.pool)
    }

    /// Household repository.
    #[must_use]
    pub fn households(&self) -> Households<'_> {
        Households::new(&self.pool)
    }

    /// Client repository.
    #[must_use]
    pub fn clients(&self) -> Clients<'_> {
        Clients::new(&self.pool)
    }

    /// Goal repository.
    #[must_use]
    pub fn goals(&self) -> Goals<'_> {
        Goals::new(&self.pool)
    }

    /// Portfolio repository.
    #[must_use]
    pub fn portfolios(&self) -> Portfolios<'_> {
        Portfolios::new(&self.pool)
    }

    /// Position repository.
    #[must_use]
    pub fn positions(&self) -> Positions<'_> {
        Positions::new(&self.pool)
    }

    /// Interaction repository.
    #[must_use]
    pub fn interactions(&self) -> Interactions<'_> {
        Interactions::new(&self.pool)
    }

    /// Sentiment log repository.
    #[must_use]
    pub fn sentiment_logs(&self) -> SentimentLogs<'_> {
        SentimentLogs::new(&self.pool)
    }

    /// Audit log repository.
    #[must_use]
    pub fn audit_logs(&self) -> AuditLogs<'_> {
        AuditLogs::new(&self.pool)
    }

    /// Action item repository.
    #[must_use]
    pub fn action_items(&self) -> ActionItems<'_> {
        ActionItems::new(&self.pool)
    }

    /// Composite read models.
    #[must_use]
    pub fn reports(&self) -> Reports<'_> {
        Reports::new(&self.pool)
    }
}

/// Opens a transaction holding the database write lock from the start.
///
/// A deferred transaction that reads first cannot upgrade to a writer once
/// another connection has committed; SQLite answers `SQLITE_BUSY` without
/// consulting the busy timeout. Taking the lock at `BEGIN` makes the wait
/// happen up front.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, CrmError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Returns `true` if `table` has a row with the given id.
pub(crate) async fn exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    id: i64,
) -> Result<bool, CrmError> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    Ok(count > 0)
}

/// Fails with [`CrmError::ForeignKey`] unless the referenced parent exists.
pub(crate) async fn require_parent(
    conn: &mut SqliteConnection,
    entity: &'static str,
    parent: &'static str,
    table: &'static str,
    id: i64,
) -> Result<(), CrmError> {
    if exists(conn, table, id).await? {
        Ok(())
    } else {
        Err(CrmError::ForeignKey { entity, parent, id })
    }
}

/// Like [`require_parent`] for nullable references.
pub(crate) async fn require_optional_parent(
    conn: &mut SqliteConnection,
    entity: &'static str,
    parent: &'static str,
    table: &'static str,
    id: Option<i64>,
) -> Result<(), CrmError> {
    match id {
        Some(id) => require_parent(conn, entity, parent, table, id).await,
        None => Ok(()),
    }
}

/// Attaches entity and field names to a storage-level uniqueness error.
pub(crate) fn label_duplicate(
    err: sqlx::Error,
    entity: &'static str,
    field: &'static str,
) -> CrmError {
    match CrmError::from(err) {
        CrmError::Duplicate { .. } => CrmError::Duplicate { entity, field },
        other => other,
    }
}

/// Maps a stored enumeration value that no longer parses.
pub(crate) fn corrupt(column: &'static str, err: &CrmError) -> CrmError {
    CrmError::Storage(format!("unexpected value in `{column}`: {err}"))
}
