//! Portfolios repository.
//!
//! Records come back with the full account number. Masking for display is
//! the caller's decision ([`Portfolio::masked`]).

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::cascade::{self, Parent};
use super::{DeletePolicy, ListQuery, begin_write, label_duplicate, require_parent};
use crate::domain::fixed_point::PORTFOLIO_VALUE;
use crate::domain::{NewPortfolio, Portfolio, PortfolioFilter, PortfolioPatch};
use crate::error::CrmError;

/// Access to the `portfolios` table.
#[derive(Debug, Clone, Copy)]
pub struct Portfolios<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Portfolios<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a portfolio for an existing client.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a blank account number or a value
    ///   outside NUMERIC(15, 2).
    /// - [`CrmError::ForeignKey`] if the client does not exist.
    /// - [`CrmError::Duplicate`] if the account number is taken.
    pub async fn create(&self, new: NewPortfolio) -> Result<Portfolio, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_parent(&mut tx, "portfolio", "client", "clients", new.client_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO portfolios (client_id, account_number, total_value, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(new.client_id)
        .bind(new.account_number)
        .bind(new.total_value.to_string())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| label_duplicate(e, "portfolio", "account_number"))?;

        let portfolio = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            portfolio_id = id,
            client_id = portfolio.client_id,
            "portfolio created"
        );
        Ok(portfolio)
    }

    /// Fetches one portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no portfolio has this id.
    pub async fn get(&self, id: i64) -> Result<Portfolio, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams portfolios matching `filter`, ordered by id.
    pub fn list(&self, filter: &PortfolioFilter) -> BoxStream<'a, Result<Portfolio, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Portfolios::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &PortfolioFilter) -> Result<Vec<Portfolio>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to portfolio `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the portfolio does not exist.
    /// - [`CrmError::Validation`] for invalid replacement values.
    /// - [`CrmError::Duplicate`] if the new account number is taken.
    pub async fn update(&self, id: i64, patch: PortfolioPatch) -> Result<Portfolio, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let portfolio = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query("UPDATE portfolios SET account_number = ?2, total_value = ?3 WHERE id = ?1")
            .bind(id)
            .bind(portfolio.account_number.as_str())
            .bind(portfolio.total_value.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| label_duplicate(e, "portfolio", "account_number"))?;
        tx.commit().await?;
        tracing::debug!(portfolio_id = id, "portfolio updated");
        Ok(portfolio)
    }

    /// Deletes portfolio `id`; under [`DeletePolicy::Cascade`] its
    /// positions go too.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the portfolio does not exist.
    /// - [`CrmError::Conflict`] if positions exist under
    ///   [`DeletePolicy::Restrict`].
    pub async fn delete(&self, id: i64, policy: DeletePolicy) -> Result<(), CrmError> {
        cascade::delete(self.pool, Parent::Portfolio, id, policy).await
    }
}

/// Reads every portfolio matching `filter` through `executor`.
pub(crate) async fn collect<'e, E>(
    executor: E,
    filter: &PortfolioFilter,
) -> Result<Vec<Portfolio>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = list_query(filter).fetch_all(executor).await?;
    rows.iter().map(from_row).collect()
}

/// Fetches portfolio `id` through `executor`.
pub(crate) async fn fetch<'e, E>(executor: E, id: i64) -> Result<Portfolio, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, client_id, account_number, total_value, created_at \
         FROM portfolios WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "portfolio",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &PortfolioFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, client_id, account_number, total_value, created_at FROM portfolios \
         WHERE (?1 IS NULL OR client_id = ?1) \
         ORDER BY CASE WHEN ?2 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.client_id)
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Portfolio, CrmError> {
    Ok(Portfolio {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        account_number: row.try_get("account_number")?,
        total_value: PORTFOLIO_VALUE.decode("total_value", row.try_get("total_value")?)?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::NewClient;
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
    async fn duplicate_account_number_names_the_field() {
        let (store, client_id) = store_with_client().await;
        assert!(
            store
                .portfolios()
                .create(NewPortfolio::new(client_id, "ACC-1001"))
                .await
                .is_ok()
        );
        let second = store
            .portfolios()
            .create(NewPortfolio::new(client_id, "ACC-1001"))
            .await;
        assert!(matches!(
            second,
            Err(CrmError::Duplicate {
                entity: "portfolio",
                field: "account_number"
            })
        ));
    }

    #[tokio::test]
    async fn total_value_defaults_to_zero() {
        let (store, client_id) = store_with_client().await;
        let Ok(portfolio) = store
            .portfolios()
            .create(NewPortfolio::new(client_id, "ACC-1"))
            .await
        else {
            panic!("insert");
        };
        assert_eq!(portfolio.total_value.to_string(), "0.00");
    }

    #[tokio::test]
    async fn rejects_value_with_three_decimals() {
        let (store, client_id) = store_with_client().await;
        let mut new = NewPortfolio::new(client_id, "ACC-2");
        new.total_value = Decimal::new(1_005, 3);
        assert!(matches!(
            store.portfolios().create(new).await,
            Err(CrmError::Validation {
                field: "total_value",
                ..
            })
        ));
    }
}
