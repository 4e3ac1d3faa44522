//! Delete rules for entities that own other rows.
//!
//! Under [`DeletePolicy::Restrict`] the first non-empty dependent table
//! blocks the delete. Under [`DeletePolicy::Cascade`] the subtree goes in
//! the same transaction. In both modes audit entries pointing at a doomed
//! manager or client block the delete, because the audit trail is
//! append-only.

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnection;

use super::{DeletePolicy, begin_write, exists};
use crate::error::CrmError;

/// An entity with dependent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    Manager,
    Household,
    Client,
    Portfolio,
    Interaction,
}

impl Parent {
    const fn entity(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Household => "household",
            Self::Client => "client",
            Self::Portfolio => "portfolio",
            Self::Interaction => "interaction",
        }
    }

    const fn table(self) -> &'static str {
        match self {
            Self::Manager => "managers",
            Self::Household => "households",
            Self::Client => "clients",
            Self::Portfolio => "portfolios",
            Self::Interaction => "interactions",
        }
    }

    /// `(table, foreign key column)` of every direct dependent.
    const fn dependents(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Manager => &[("clients", "manager_id")],
            Self::Household => &[("clients", "household_id")],
            Self::Client => &[
                ("goals", "client_id"),
                ("portfolios", "client_id"),
                ("interactions", "client_id"),
                ("action_items", "client_id"),
            ],
            Self::Portfolio => &[("positions", "portfolio_id")],
            Self::Interaction => &[("sentiment_logs", "interaction_id")],
        }
    }

    /// Counts audit entries that would lose their referent.
    const fn audit_query(self, policy: DeletePolicy) -> Option<&'static str> {
        match (self, policy) {
            (Self::Manager, DeletePolicy::Restrict) => {
                Some("SELECT COUNT(*) FROM audit_logs WHERE manager_id = ?1")
            }
            (Self::Manager, DeletePolicy::Cascade) => Some(
                "SELECT COUNT(*) FROM audit_logs WHERE manager_id = ?1 \
                 OR client_id IN (SELECT id FROM clients WHERE manager_id = ?1)",
            ),
            (Self::Household, DeletePolicy::Cascade) => Some(
                "SELECT COUNT(*) FROM audit_logs \
                 WHERE client_id IN (SELECT id FROM clients WHERE household_id = ?1)",
            ),
            (Self::Client, _) => Some("SELECT COUNT(*) FROM audit_logs WHERE client_id = ?1"),
            _ => None,
        }
    }
}

/// Deletes `parent` row `id` according to `policy`.
pub(crate) async fn delete(
    pool: &SqlitePool,
    parent: Parent,
    id: i64,
    policy: DeletePolicy,
) -> Result<(), CrmError> {
    let entity = parent.entity();
    let mut tx = begin_write(pool).await?;

    if !exists(&mut tx, parent.table(), id).await? {
        return Err(CrmError::NotFound { entity, id });
    }

    if policy == DeletePolicy::Restrict {
        for &(table, column) in parent.dependents() {
            let count = count_rows(&mut tx, table, column, id).await?;
            if count > 0 {
                tracing::warn!(entity, id, dependent = table, count, "delete blocked");
                return Err(CrmError::Conflict {
                    entity,
                    id,
                    dependent: table,
                    count,
                });
            }
        }
    }

    if let Some(sql) = parent.audit_query(policy) {
        let count: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(&mut *tx).await?;
        if count > 0 {
            tracing::warn!(entity, id, count, "delete blocked by audit trail");
            return Err(CrmError::Conflict {
                entity,
                id,
                dependent: "audit_logs",
                count,
            });
        }
    }

    let removed = if policy == DeletePolicy::Cascade {
        purge_dependents(&mut tx, parent, id).await?
    } else {
        0
    };

    let sql = format!("DELETE FROM {} WHERE id = ?1", parent.table());
    sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(entity, id, cascaded = removed, "deleted");
    Ok(())
}

async fn count_rows(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    id: i64,
) -> Result<i64, CrmError> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1");
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    Ok(count)
}

/// Removes every row below `parent`, returning how many went.
async fn purge_dependents(
    conn: &mut SqliteConnection,
    parent: Parent,
    id: i64,
) -> Result<u64, CrmError> {
    match parent {
        Parent::Manager => {
            let removed = purge_clients(conn, "manager_id = ?1", id).await?;
            Ok(removed + execute(conn, "DELETE FROM clients WHERE manager_id = ?1", id).await?)
        }
        Parent::Household => {
            let removed = purge_clients(conn, "household_id = ?1", id).await?;
            Ok(removed + execute(conn, "DELETE FROM clients WHERE household_id = ?1", id).await?)
        }
        Parent::Client => purge_clients(conn, "id = ?1", id).await,
        Parent::Portfolio => {
            execute(conn, "DELETE FROM positions WHERE portfolio_id = ?1", id).await
        }
        Parent::Interaction => {
            execute(conn, "DELETE FROM sentiment_logs WHERE interaction_id = ?1", id).await
        }
    }
}

/// Removes everything owned by the clients matching `clients_where`,
/// leaving the client rows themselves.
async fn purge_clients(
    conn: &mut SqliteConnection,
    clients_where: &str,
    id: i64,
) -> Result<u64, CrmError> {
    let clients = format!("SELECT id FROM clients WHERE {clients_where}");
    let statements = [
        format!(
            "DELETE FROM sentiment_logs WHERE interaction_id IN \
             (SELECT id FROM interactions WHERE client_id IN ({clients}))"
        ),
        format!("DELETE FROM interactions WHERE client_id IN ({clients})"),
        format!(
            "DELETE FROM positions WHERE portfolio_id IN \
             (SELECT id FROM portfolios WHERE client_id IN ({clients}))"
        ),
        format!("DELETE FROM portfolios WHERE client_id IN ({clients})"),
        format!("DELETE FROM goals WHERE client_id IN ({clients})"),
        format!("DELETE FROM action_items WHERE client_id IN ({clients})"),
    ];

    let mut removed = 0;
    for sql in &statements {
        removed += execute(conn, sql, id).await?;
    }
    Ok(removed)
}

async fn execute(conn: &mut SqliteConnection, sql: &str, id: i64) -> Result<u64, CrmError> {
    let result = sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
