//! Managers repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::cascade::{self, Parent};
use super::{DeletePolicy, ListQuery, begin_write, label_duplicate};
use crate::domain::manager::DEFAULT_ROLE;
use crate::domain::{Manager, ManagerFilter, ManagerPatch, NewManager};
use crate::error::CrmError;

/// Access to the `managers` table.
#[derive(Debug, Clone, Copy)]
pub struct Managers<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Managers<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a manager. The email is stored lower-cased.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a malformed email or blank hash.
    /// - [`CrmError::Duplicate`] if the email is taken.
    pub async fn create(&self, new: NewManager) -> Result<Manager, CrmError> {
        let new = new.validate()?;
        let role = new.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
        let mut tx = begin_write(self.pool).await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO managers (email, password_hash, role, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| label_duplicate(e, "manager", "email"))?;

        let manager = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(manager_id = id, role = %manager.role, "manager created");
        Ok(manager)
    }

    /// Fetches one manager.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no manager has this id.
    pub async fn get(&self, id: i64) -> Result<Manager, CrmError> {
        fetch(self.pool, id).await
    }

    /// Looks a manager up by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a [`CrmError`] on storage failure.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Manager>, CrmError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM managers WHERE email = ?1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.pool)
        .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// Streams managers matching `filter`, ordered by id.
    pub fn list(&self, filter: &ManagerFilter) -> BoxStream<'a, Result<Manager, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Managers::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &ManagerFilter) -> Result<Vec<Manager>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to manager `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the manager does not exist.
    /// - [`CrmError::Validation`] for invalid replacement values.
    /// - [`CrmError::Duplicate`] if the new email is taken.
    pub async fn update(&self, id: i64, patch: ManagerPatch) -> Result<Manager, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let manager = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query("UPDATE managers SET email = ?2, password_hash = ?3, role = ?4 WHERE id = ?1")
            .bind(id)
            .bind(manager.email.as_str())
            .bind(manager.password_hash.as_str())
            .bind(manager.role.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| label_duplicate(e, "manager", "email"))?;
        tx.commit().await?;
        tracing::debug!(manager_id = id, "manager updated");
        Ok(manager)
    }

    /// Deletes manager `id`.
    ///
    /// Under [`DeletePolicy::Cascade`] the manager's clients and their
    /// records go too.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the manager does not exist.
    /// - [`CrmError::Conflict`] if clients exist under
    ///   [`DeletePolicy::Restrict`], or if audit entries reference the
    ///   manager or a client that would be removed.
    pub async fn delete(&self, id: i64, policy: DeletePolicy) -> Result<(), CrmError> {
        cascade::delete(self.pool, Parent::Manager, id, policy).await
    }
}

/// Fetches manager `id` through `executor`.
pub(crate) async fn fetch<'e, E>(executor: E, id: i64) -> Result<Manager, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, email, password_hash, role, created_at FROM managers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "manager",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &ManagerFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, email, password_hash, role, created_at FROM managers \
         WHERE (?1 IS NULL OR role = ?1) \
         ORDER BY CASE WHEN ?2 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.role.clone())
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Manager, CrmError> {
    Ok(Manager {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
    })
}
