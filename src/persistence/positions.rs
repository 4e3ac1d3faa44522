//! Positions repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ListQuery, begin_write, corrupt, require_parent};
use crate::domain::fixed_point::{COST_BASIS, POSITION_QUANTITY};
use crate::domain::{NewPosition, Position, PositionFilter, PositionPatch};
use crate::error::CrmError;

/// Access to the `positions` table.
#[derive(Debug, Clone, Copy)]
pub struct Positions<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Positions<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a holding into an existing portfolio. The ticker is stored
    /// upper-cased.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a malformed ticker or amounts outside
    ///   their fixed-point columns.
    /// - [`CrmError::ForeignKey`] if the portfolio does not exist.
    pub async fn create(&self, new: NewPosition) -> Result<Position, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_parent(&mut tx, "position", "portfolio", "portfolios", new.portfolio_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO positions (portfolio_id, ticker, quantity, cost_basis, position_type, \
             created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )
        .bind(new.portfolio_id)
        .bind(new.ticker)
        .bind(new.quantity.to_string())
        .bind(new.cost_basis.to_string())
        .bind(new.position_type.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let position = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            position_id = id,
            portfolio_id = position.portfolio_id,
            ticker = %position.ticker,
            "position created"
        );
        Ok(position)
    }

    /// Fetches one position.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no position has this id.
    pub async fn get(&self, id: i64) -> Result<Position, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams positions matching `filter`, ordered by id.
    pub fn list(&self, filter: &PositionFilter) -> BoxStream<'a, Result<Position, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Positions::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &PositionFilter) -> Result<Vec<Position>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to position `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the position does not exist.
    /// - [`CrmError::Validation`] for invalid replacement values.
    pub async fn update(&self, id: i64, patch: PositionPatch) -> Result<Position, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let position = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query(
            "UPDATE positions SET ticker = ?2, quantity = ?3, cost_basis = ?4, \
             position_type = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(position.ticker.as_str())
        .bind(position.quantity.to_string())
        .bind(position.cost_basis.to_string())
        .bind(position.position_type.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::debug!(position_id = id, "position updated");
        Ok(position)
    }

    /// Deletes position `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the position does not exist.
    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let result = sqlx::query("DELETE FROM positions WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CrmError::NotFound {
                entity: "position",
                id,
            });
        }
        tracing::info!(position_id = id, "position deleted");
        Ok(())
    }
}

/// Reads every position matching `filter` through `executor`.
pub(crate) async fn collect<'e, E>(
    executor: E,
    filter: &PositionFilter,
) -> Result<Vec<Position>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = list_query(filter).fetch_all(executor).await?;
    rows.iter().map(from_row).collect()
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Position, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, portfolio_id, ticker, quantity, cost_basis, position_type, created_at \
         FROM positions WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "position",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &PositionFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, portfolio_id, ticker, quantity, cost_basis, position_type, created_at \
         FROM positions \
         WHERE (?1 IS NULL OR portfolio_id = ?1) \
         AND (?2 IS NULL OR ticker = ?2) \
         ORDER BY CASE WHEN ?3 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.portfolio_id)
    .bind(filter.ticker.as_deref().map(|t| t.trim().to_uppercase()))
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Position, CrmError> {
    let position_type: &str = row.try_get("position_type")?;
    Ok(Position {
        id: row.try_get("id")?,
        portfolio_id: row.try_get("portfolio_id")?,
        ticker: row.try_get("ticker")?,
        quantity: POSITION_QUANTITY.decode("quantity", row.try_get("quantity")?)?,
        cost_basis: COST_BASIS.decode("cost_basis", row.try_get("cost_basis")?)?,
        position_type: position_type
            .parse()
            .map_err(|e| corrupt("position_type", &e))?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{NewClient, NewPortfolio, PositionType};
    use crate::persistence::Store;

    async fn store_with_portfolio() -> (Store, i64) {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(client) = store.clients().create(NewClient::new("Ada", "Park")).await else {
            panic!("client insert");
        };
        let Ok(portfolio) = store
            .portfolios()
            .create(NewPortfolio::new(client.id, "ACC-77"))
            .await
        else {
            panic!("portfolio insert");
        };
        (store, portfolio.id)
    }

    fn holding(portfolio_id: i64, ticker: &str, quantity: Decimal) -> NewPosition {
        NewPosition {
            portfolio_id,
            ticker: ticker.to_string(),
            quantity,
            cost_basis: Decimal::new(10_000, 2),
            position_type: PositionType::Equity,
        }
    }

    #[tokio::test]
    async fn short_positions_keep_their_sign() {
        let (store, portfolio_id) = store_with_portfolio().await;
        let Ok(position) = store
            .positions()
            .create(holding(portfolio_id, "tsla", Decimal::new(-25, 1)))
            .await
        else {
            panic!("insert");
        };
        assert_eq!(position.ticker, "TSLA");
        assert_eq!(position.quantity.to_string(), "-2.5000");
        assert_eq!(position.cost_basis.to_string(), "100.00");
    }

    #[tokio::test]
    async fn ticker_filter_is_case_insensitive() {
        let (store, portfolio_id) = store_with_portfolio().await;
        for ticker in ["AAPL", "MSFT", "aapl"] {
            let created = store
                .positions()
                .create(holding(portfolio_id, ticker, Decimal::ONE))
                .await;
            assert!(created.is_ok());
        }
        let filter = PositionFilter {
            ticker: Some("Aapl".to_string()),
            ..PositionFilter::in_portfolio(portfolio_id)
        };
        let Ok(found) = store.positions().list_all(&filter).await else {
            panic!("list");
        };
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn overlong_ticker_is_rejected() {
        let (store, portfolio_id) = store_with_portfolio().await;
        let result = store
            .positions()
            .create(holding(portfolio_id, "ABCDEFGHIJK", Decimal::ONE))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::Validation { field: "ticker", .. })
        ));
    }
}
