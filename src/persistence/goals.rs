//! Financial goals repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ListQuery, begin_write, require_parent};
use crate::domain::fixed_point::GOAL_AMOUNT;
use crate::domain::{Goal, GoalFilter, GoalPatch, NewGoal};
use crate::error::CrmError;

const SELECT: &str = "SELECT id, client_id, target_amount, target_date, description, priority, \
                      created_at FROM goals";

/// Access to the `goals` table.
#[derive(Debug, Clone, Copy)]
pub struct Goals<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Goals<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a goal for an existing client.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for an out-of-range amount or priority.
    /// - [`CrmError::ForeignKey`] if the client does not exist.
    pub async fn create(&self, new: NewGoal) -> Result<Goal, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_parent(&mut tx, "goal", "client", "clients", new.client_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO goals (client_id, target_amount, target_date, description, priority, \
             created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )
        .bind(new.client_id)
        .bind(new.target_amount.to_string())
        .bind(new.target_date)
        .bind(new.description)
        .bind(new.priority)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let goal = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(goal_id = id, client_id = goal.client_id, "goal created");
        Ok(goal)
    }

    /// Fetches one goal.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no goal has this id.
    pub async fn get(&self, id: i64) -> Result<Goal, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams goals matching `filter`, ordered by id.
    pub fn list(&self, filter: &GoalFilter) -> BoxStream<'a, Result<Goal, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Goals::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &GoalFilter) -> Result<Vec<Goal>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to goal `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the goal does not exist.
    /// - [`CrmError::Validation`] for invalid replacement values.
    pub async fn update(&self, id: i64, patch: GoalPatch) -> Result<Goal, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let goal = patch.apply(fetch(&mut *tx, id).await?)?;

        sqlx::query(
            "UPDATE goals SET target_amount = ?2, target_date = ?3, description = ?4, \
             priority = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(goal.target_amount.to_string())
        .bind(goal.target_date)
        .bind(goal.description.as_deref())
        .bind(goal.priority)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(goal_id = id, "goal updated");
        Ok(goal)
    }

    /// Deletes goal `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the goal does not exist.
    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CrmError::NotFound { entity: "goal", id });
        }
        tracing::info!(goal_id = id, "goal deleted");
        Ok(())
    }
}

/// Reads every goal matching `filter` through `executor`.
pub(crate) async fn collect<'e, E>(executor: E, filter: &GoalFilter) -> Result<Vec<Goal>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = list_query(filter).fetch_all(executor).await?;
    rows.iter().map(from_row).collect()
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Goal, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("{SELECT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(CrmError::NotFound { entity: "goal", id })?;
    from_row(&row)
}

fn list_query(filter: &GoalFilter) -> ListQuery {
    let sql: &'static str = concat!(
        "SELECT id, client_id, target_amount, target_date, description, priority, created_at ",
        "FROM goals WHERE (?1 IS NULL OR client_id = ?1) ",
        "ORDER BY CASE WHEN ?2 = 'desc' THEN -id ELSE id END"
    );
    sqlx::query(sql)
        .bind(filter.client_id)
        .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Goal, CrmError> {
    Ok(Goal {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        target_amount: GOAL_AMOUNT.decode("target_amount", row.try_get("target_amount")?)?,
        target_date: row.try_get("target_date")?,
        description: row.try_get("description")?,
        priority: row.try_get("priority")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{NewClient, SortOrder};
    use crate::persistence::Store;

    async fn store_with_client() -> (Store, i64) {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(client) = store.clients().create(NewClient::new("Ada", "Park")).await else {
            panic!("client insert");
        };
        (store, client.id)
    }

    #[tokio::test]
    async fn create_rejects_missing_client() {
        let (store, _) = store_with_client().await;
        let result = store.goals().create(NewGoal::new(999, Decimal::ONE)).await;
        assert!(matches!(
            result,
            Err(CrmError::ForeignKey {
                parent: "client",
                id: 999,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn amount_is_rescaled_to_two_places() {
        let (store, client_id) = store_with_client().await;
        let Ok(goal) = store
            .goals()
            .create(NewGoal::new(client_id, Decimal::new(5, 0)))
            .await
        else {
            panic!("goal insert");
        };
        assert_eq!(goal.target_amount.to_string(), "5.00");
        assert_eq!(goal.priority, 5);
    }

    #[tokio::test]
    async fn list_honours_order() {
        let (store, client_id) = store_with_client().await;
        for amount in [1, 2, 3] {
            let created = store
                .goals()
                .create(NewGoal::new(client_id, Decimal::new(amount, 0)))
                .await;
            assert!(created.is_ok());
        }
        let filter = GoalFilter {
            client_id: Some(client_id),
            order: SortOrder::Desc,
        };
        let Ok(goals) = store.goals().list_all(&filter).await else {
            panic!("list");
        };
        let ids: Vec<i64> = goals.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let (store, _) = store_with_client().await;
        assert!(matches!(
            store.goals().delete(41).await,
            Err(CrmError::NotFound { entity: "goal", id: 41 })
        ));
    }
}
