//! Households repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::cascade::{self, Parent};
use super::{DeletePolicy, ListQuery, begin_write};
use crate::domain::{Household, HouseholdFilter, HouseholdPatch, NewHousehold};
use crate::error::CrmError;

/// Access to the `households` table.
#[derive(Debug, Clone, Copy)]
pub struct Households<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Households<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a household.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank name.
    pub async fn create(&self, new: NewHousehold) -> Result<Household, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO households (name, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(new.name)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let household = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(household_id = id, "household created");
        Ok(household)
    }

    /// Fetches one household.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no household has this id.
    pub async fn get(&self, id: i64) -> Result<Household, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams households, ordered by id.
    pub fn list(&self, filter: &HouseholdFilter) -> BoxStream<'a, Result<Household, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Households::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &HouseholdFilter) -> Result<Vec<Household>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Renames household `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the household does not exist.
    /// - [`CrmError::Validation`] for a blank name.
    pub async fn update(&self, id: i64, patch: HouseholdPatch) -> Result<Household, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let household = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query("UPDATE households SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(household.name.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(household_id = id, "household updated");
        Ok(household)
    }

    /// Deletes household `id`.
    ///
    /// Under [`DeletePolicy::Cascade`] member clients and everything they
    /// own go too.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the household does not exist.
    /// - [`CrmError::Conflict`] if members exist under
    ///   [`DeletePolicy::Restrict`], or if a cascade would orphan audit
    ///   entries.
    pub async fn delete(&self, id: i64, policy: DeletePolicy) -> Result<(), CrmError> {
        cascade::delete(self.pool, Parent::Household, id, policy).await
    }
}

/// Fetches household `id` through `executor`.
pub(crate) async fn fetch<'e, E>(executor: E, id: i64) -> Result<Household, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query("SELECT id, name, created_at FROM households WHERE id = ?1")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(CrmError::NotFound {
            entity: "household",
            id,
        })?;
    from_row(&row)
}

fn list_query(filter: &HouseholdFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, name, created_at FROM households \
         ORDER BY CASE WHEN ?1 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Household, CrmError> {
    Ok(Household {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}
