//! Action items repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ListQuery, begin_write, corrupt, require_parent};
use crate::domain::{ActionItem, ActionItemFilter, ActionItemPatch, NewActionItem};
use crate::error::CrmError;

/// Access to the `action_items` table.
#[derive(Debug, Clone, Copy)]
pub struct ActionItems<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActionItems<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts an action item for an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::ForeignKey`] if the client does not exist.
    pub async fn create(&self, new: NewActionItem) -> Result<ActionItem, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        require_parent(&mut tx, "action_item", "client", "clients", new.client_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO action_items (client_id, status, ai_rationale, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(new.client_id)
        .bind(new.status.as_str())
        .bind(new.ai_rationale)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let item = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            action_item_id = id,
            client_id = item.client_id,
            status = %item.status,
            "action item created"
        );
        Ok(item)
    }

    /// Fetches one action item.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no item has this id.
    pub async fn get(&self, id: i64) -> Result<ActionItem, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams action items matching `filter`, ordered by id.
    pub fn list(&self, filter: &ActionItemFilter) -> BoxStream<'a, Result<ActionItem, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`ActionItems::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &ActionItemFilter) -> Result<Vec<ActionItem>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to action item `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the item does not exist.
    pub async fn update(&self, id: i64, patch: ActionItemPatch) -> Result<ActionItem, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let item = patch.apply(fetch(&mut *tx, id).await?);
        sqlx::query("UPDATE action_items SET status = ?2, ai_rationale = ?3 WHERE id = ?1")
            .bind(id)
            .bind(item.status.as_str())
            .bind(item.ai_rationale.as_deref())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(action_item_id = id, status = %item.status, "action item updated");
        Ok(item)
    }

    /// Deletes action item `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the item does not exist.
    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let result = sqlx::query("DELETE FROM action_items WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CrmError::NotFound {
                entity: "action_item",
                id,
            });
        }
        tracing::info!(action_item_id = id, "action item deleted");
        Ok(())
    }
}

/// Reads every action item matching `filter` through `executor`.
pub(crate) async fn collect<'e, E>(
    executor: E,
    filter: &ActionItemFilter,
) -> Result<Vec<ActionItem>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = list_query(filter).fetch_all(executor).await?;
    rows.iter().map(from_row).collect()
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<ActionItem, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, client_id, status, ai_rationale, created_at FROM action_items WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "action_item",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &ActionItemFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, client_id, status, ai_rationale, created_at FROM action_items \
         WHERE (?1 IS NULL OR client_id = ?1) \
         AND (?2 IS NULL OR status = ?2) \
         ORDER BY CASE WHEN ?3 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.client_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<ActionItem, CrmError> {
    let status: &str = row.try_get("status")?;
    Ok(ActionItem {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        status: status.parse().map_err(|e| corrupt("status", &e))?,
        ai_rationale: row.try_get("ai_rationale")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ActionStatus, NewClient};
    use crate::persistence::Store;

    #[tokio::test]
    async fn complete_and_filter_by_status() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(client) = store.clients().create(NewClient::new("Ada", "Park")).await else {
            panic!("client insert");
        };
        let Ok(first) = store
            .action_items()
            .create(NewActionItem::new(client.id, "rebalance"))
            .await
        else {
            panic!("insert");
        };
        assert_eq!(first.status, ActionStatus::Pending);
        assert!(
            store
                .action_items()
                .create(NewActionItem::new(client.id, "call back"))
                .await
                .is_ok()
        );

        let patch = ActionItemPatch {
            status: Some(ActionStatus::Completed),
            ..ActionItemPatch::default()
        };
        let Ok(done) = store.action_items().update(first.id, patch).await else {
            panic!("update");
        };
        assert_eq!(done.status, ActionStatus::Completed);
        assert_eq!(done.ai_rationale.as_deref(), Some("rebalance"));

        let filter = ActionItemFilter {
            status: Some(ActionStatus::Pending),
            ..ActionItemFilter::for_client(client.id)
        };
        let Ok(pending) = store.action_items().list_all(&filter).await else {
            panic!("list");
        };
        let [item] = pending.as_slice() else {
            panic!("expected one pending item, got {}", pending.len());
        };
        assert_eq!(item.ai_rationale.as_deref(), Some("call back"));
    }
}
