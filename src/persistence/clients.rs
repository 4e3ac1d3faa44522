//! Clients repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::cascade::{self, Parent};
use super::{DeletePolicy, ListQuery, begin_write, require_optional_parent};
use crate::domain::{Client, ClientFilter, ClientPatch, NewClient};
use crate::error::CrmError;

const COLUMNS: &str =
    "id, household_id, manager_id, first_name, last_name, risk_score, investment_goal, \
     is_active, created_at";

/// Access to the `clients` table.
#[derive(Debug, Clone, Copy)]
pub struct Clients<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Clients<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts an active client.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for blank names.
    /// - [`CrmError::ForeignKey`] if a given household or manager does not
    ///   exist.
    pub async fn create(&self, new: NewClient) -> Result<Client, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_optional_parent(&mut tx, "client", "household", "households", new.household_id)
            .await?;
        require_optional_parent(&mut tx, "client", "manager", "managers", new.manager_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO clients (household_id, manager_id, first_name, last_name, risk_score, \
             investment_goal, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7) RETURNING id",
        )
        .bind(new.household_id)
        .bind(new.manager_id)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.risk_score)
        .bind(new.investment_goal)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let client = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            client_id = id,
            household_id = ?client.household_id,
            manager_id = ?client.manager_id,
            "client created"
        );
        Ok(client)
    }

    /// Fetches one client.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no client has this id.
    pub async fn get(&self, id: i64) -> Result<Client, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams clients matching `filter`, ordered by id.
    pub fn list(&self, filter: &ClientFilter) -> BoxStream<'a, Result<Client, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Clients::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &ClientFilter) -> Result<Vec<Client>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to client `id`.
    ///
    /// Household and manager may be reassigned or cleared; new targets must
    /// exist.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the client does not exist.
    /// - [`CrmError::Validation`] for blank names.
    /// - [`CrmError::ForeignKey`] for a missing household or manager.
    pub async fn update(&self, id: i64, patch: ClientPatch) -> Result<Client, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let client = patch.apply(fetch(&mut *tx, id).await?)?;
        require_optional_parent(&mut tx, "client", "household", "households", client.household_id)
            .await?;
        require_optional_parent(&mut tx, "client", "manager", "managers", client.manager_id)
            .await?;

        sqlx::query(
            "UPDATE clients SET household_id = ?2, manager_id = ?3, first_name = ?4, \
             last_name = ?5, risk_score = ?6, investment_goal = ?7, is_active = ?8 WHERE id = ?1",
        )
        .bind(id)
        .bind(client.household_id)
        .bind(client.manager_id)
        .bind(client.first_name.as_str())
        .bind(client.last_name.as_str())
        .bind(client.risk_score)
        .bind(client.investment_goal.as_deref())
        .bind(client.is_active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(client_id = id, "client updated");
        Ok(client)
    }

    /// Soft-deletes client `id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the client does not exist.
    pub async fn deactivate(&self, id: i64) -> Result<Client, CrmError> {
        self.set_active(id, false).await
    }

    /// Reverses [`Clients::deactivate`]. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the client does not exist.
    pub async fn reactivate(&self, id: i64) -> Result<Client, CrmError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Client, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let result = sqlx::query("UPDATE clients SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CrmError::NotFound {
                entity: "client",
                id,
            });
        }
        let client = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(client_id = id, active, "client activation changed");
        Ok(client)
    }

    /// Hard-deletes client `id`.
    ///
    /// Under [`DeletePolicy::Cascade`] goals, portfolios with positions,
    /// interactions with sentiment logs, and action items go too.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the client does not exist.
    /// - [`CrmError::Conflict`] if dependents exist under
    ///   [`DeletePolicy::Restrict`], or if audit entries reference the
    ///   client.
    pub async fn delete(&self, id: i64, policy: DeletePolicy) -> Result<(), CrmError> {
        cascade::delete(self.pool, Parent::Client, id, policy).await
    }
}

/// Fetches client `id` through `executor`.
pub(crate) async fn fetch<'e, E>(executor: E, id: i64) -> Result<Client, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM clients WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(CrmError::NotFound {
            entity: "client",
            id,
        })?;
    from_row(&row)
}

fn list_query(filter: &ClientFilter) -> ListQuery {
    sqlx::query(concat!(
        "SELECT id, household_id, manager_id, first_name, last_name, risk_score, ",
        "investment_goal, is_active, created_at FROM clients ",
        "WHERE (?1 IS NULL OR household_id = ?1) ",
        "AND (?2 IS NULL OR manager_id = ?2) ",
        "AND (?3 IS NULL OR is_active = ?3) ",
        "ORDER BY CASE WHEN ?4 = 'desc' THEN -id ELSE id END"
    ))
    .bind(filter.household_id)
    .bind(filter.manager_id)
    .bind(filter.active)
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Client, CrmError> {
    Ok(Client {
        id: row.try_get("id")?,
        household_id: row.try_get("household_id")?,
        manager_id: row.try_get("manager_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        risk_score: row.try_get("risk_score")?,
        investment_goal: row.try_get("investment_goal")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{NewHousehold, NewManager};
    use crate::persistence::Store;

    async fn store() -> Store {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        store
    }

    #[tokio::test]
    async fn new_clients_are_active() {
        let store = store().await;
        let Ok(client) = store.clients().create(NewClient::new("Jo", "Lim")).await else {
            panic!("insert");
        };
        assert!(client.is_active);
        assert_eq!(client.household_id, None);
    }

    #[tokio::test]
    async fn create_checks_household_and_manager() {
        let store = store().await;
        let result = store
            .clients()
            .create(NewClient::new("Jo", "Lim").in_household(8))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::ForeignKey {
                parent: "household",
                id: 8,
                ..
            })
        ));

        let result = store
            .clients()
            .create(NewClient::new("Jo", "Lim").managed_by(3))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::ForeignKey {
                parent: "manager",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn deactivate_is_idempotent_and_filterable() {
        let store = store().await;
        let Ok(a) = store.clients().create(NewClient::new("A", "One")).await else {
            panic!("insert");
        };
        assert!(store.clients().create(NewClient::new("B", "Two")).await.is_ok());

        for _ in 0..2 {
            let Ok(client) = store.clients().deactivate(a.id).await else {
                panic!("deactivate");
            };
            assert!(!client.is_active);
        }

        let filter = ClientFilter {
            active: Some(true),
            ..ClientFilter::default()
        };
        let Ok(active) = store.clients().list_all(&filter).await else {
            panic!("list");
        };
        let [only] = active.as_slice() else {
            panic!("expected one active client, got {}", active.len());
        };
        assert_eq!(only.first_name, "B");

        let Ok(back) = store.clients().reactivate(a.id).await else {
            panic!("reactivate");
        };
        assert!(back.is_active);
    }

    #[tokio::test]
    async fn update_can_reassign_and_clear_references() {
        let store = store().await;
        let Ok(household) = store.households().create(NewHousehold::new("Lim")).await else {
            panic!("household");
        };
        let Ok(manager) = store
            .managers()
            .create(NewManager::new("m@firm.example", "h"))
            .await
        else {
            panic!("manager");
        };
        let Ok(client) = store.clients().create(NewClient::new("Jo", "Lim")).await else {
            panic!("client");
        };

        let patch = ClientPatch {
            household_id: Some(Some(household.id)),
            manager_id: Some(Some(manager.id)),
            ..ClientPatch::default()
        };
        let Ok(updated) = store.clients().update(client.id, patch).await else {
            panic!("update");
        };
        assert_eq!(updated.household_id, Some(household.id));
        assert_eq!(updated.manager_id, Some(manager.id));

        let patch = ClientPatch {
            household_id: Some(None),
            ..ClientPatch::default()
        };
        let Ok(updated) = store.clients().update(client.id, patch).await else {
            panic!("update");
        };
        assert_eq!(updated.household_id, None);
        assert_eq!(updated.manager_id, Some(manager.id));

        let patch = ClientPatch {
            manager_id: Some(Some(404)),
            ..ClientPatch::default()
        };
        assert!(matches!(
            store.clients().update(client.id, patch).await,
            Err(CrmError::ForeignKey { .. })
        ));
    }
}
