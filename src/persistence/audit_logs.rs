//! Audit log repository. Append-only: entries can be added and read but
//! never changed or removed.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnection, SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ListQuery, begin_write, require_optional_parent};
use crate::domain::{AuditLog, AuditLogFilter, NewAuditLog};
use crate::error::CrmError;

/// Access to the `audit_logs` table.
#[derive(Debug, Clone, Copy)]
pub struct AuditLogs<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditLogs<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an entry stamped with the current time.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a blank action.
    /// - [`CrmError::ForeignKey`] if a given manager or client does not
    ///   exist.
    pub async fn create(&self, new: NewAuditLog) -> Result<AuditLog, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let entry = append(&mut tx, new).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Fetches one entry.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no entry has this id.
    pub async fn get(&self, id: i64) -> Result<AuditLog, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams entries matching `filter`, ordered by id.
    pub fn list(&self, filter: &AuditLogFilter) -> BoxStream<'a, Result<AuditLog, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`AuditLogs::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &AuditLogFilter) -> Result<Vec<AuditLog>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Always refused.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::OperationNotAllowed`] unconditionally.
    pub async fn update(&self, id: i64) -> Result<AuditLog, CrmError> {
        tracing::warn!(audit_log_id = id, "refused audit log update");
        Err(CrmError::OperationNotAllowed(
            "audit log entries cannot be modified".to_string(),
        ))
    }

    /// Always refused.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::OperationNotAllowed`] unconditionally.
    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        tracing::warn!(audit_log_id = id, "refused audit log delete");
        Err(CrmError::OperationNotAllowed(
            "audit log entries cannot be deleted".to_string(),
        ))
    }
}

/// Appends `new` inside the caller's transaction.
pub(crate) async fn append(
    conn: &mut SqliteConnection,
    new: NewAuditLog,
) -> Result<AuditLog, CrmError> {
    let new = new.validate()?;
    require_optional_parent(conn, "audit_log", "manager", "managers", new.manager_id).await?;
    require_optional_parent(conn, "audit_log", "client", "clients", new.client_id).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO audit_logs (manager_id, client_id, action, timestamp) \
         VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(new.manager_id)
    .bind(new.client_id)
    .bind(new.action)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    let entry = fetch(&mut *conn, id).await?;
    tracing::info!(
        audit_log_id = id,
        manager_id = ?entry.manager_id,
        client_id = ?entry.client_id,
        action = %entry.action,
        "audit entry appended"
    );
    Ok(entry)
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<AuditLog, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, manager_id, client_id, action, timestamp FROM audit_logs WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "audit_log",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &AuditLogFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, manager_id, client_id, action, timestamp FROM audit_logs \
         WHERE (?1 IS NULL OR manager_id = ?1) \
         AND (?2 IS NULL OR client_id = ?2) \
         AND (?3 IS NULL OR action = ?3) \
         ORDER BY CASE WHEN ?4 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.manager_id)
    .bind(filter.client_id)
    .bind(filter.action.clone())
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<AuditLog, CrmError> {
    Ok(AuditLog {
        id: row.try_get("id")?,
        manager_id: row.try_get("manager_id")?,
        client_id: row.try_get("client_id")?,
        action: row.try_get("action")?,
        timestamp: row.try_get("timestamp")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::audit_log::ACTION_VIEW;
    use crate::persistence::Store;

    #[tokio::test]
    async fn system_entries_need_no_manager() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(entry) = store.audit_logs().create(NewAuditLog::new(ACTION_VIEW)).await else {
            panic!("append");
        };
        assert_eq!(entry.manager_id, None);
        assert_eq!(entry.action, "view");
    }

    #[tokio::test]
    async fn entries_cannot_change() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(entry) = store.audit_logs().create(NewAuditLog::new("export")).await else {
            panic!("append");
        };
        assert!(matches!(
            store.audit_logs().update(entry.id).await,
            Err(CrmError::OperationNotAllowed(_))
        ));
        assert!(matches!(
            store.audit_logs().delete(entry.id).await,
            Err(CrmError::OperationNotAllowed(_))
        ));
        assert!(store.audit_logs().get(entry.id).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_manager_is_rejected() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let result = store
            .audit_logs()
            .create(NewAuditLog::new(ACTION_VIEW).by_manager(Some(5)))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::ForeignKey {
                parent: "manager",
                ..
            })
        ));
    }
}
