//! Composite reads spanning several tables.
//!
//! Each report runs inside one transaction so the parts it stitches
//! together come from the same snapshot.

use std::collections::HashMap;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnection;

use super::{
    action_items, audit_logs, begin_write, clients, exists, goals, households, interactions,
    managers, portfolios, positions, sentiment_logs,
};
use crate::domain::audit_log::ACTION_VIEW;
use crate::domain::{
    ActionItemFilter, ClientProfile, Goal, GoalFilter, InteractionFilter,
    InteractionWithSentiment, NewAuditLog, PortfolioFilter, PortfolioHoldings, Position,
    PositionFilter, SentimentLog,
};
use crate::error::CrmError;

/// Read models assembled from several repositories.
#[derive(Debug, Clone, Copy)]
pub struct Reports<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Reports<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Every goal of a client, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the client does not exist.
    pub async fn goals_for_client(&self, client_id: i64) -> Result<Vec<Goal>, CrmError> {
        let mut tx = self.pool.begin().await?;
        require(&mut tx, "client", "clients", client_id).await?;
        let goals = goals::collect(&mut *tx, &GoalFilter::for_client(client_id)).await?;
        tx.commit().await?;
        Ok(goals)
    }

    /// Every position in a portfolio, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the portfolio does not exist.
    pub async fn positions_in_portfolio(
        &self,
        portfolio_id: i64,
    ) -> Result<Vec<Position>, CrmError> {
        let mut tx = self.pool.begin().await?;
        require(&mut tx, "portfolio", "portfolios", portfolio_id).await?;
        let positions =
            positions::collect(&mut *tx, &PositionFilter::in_portfolio(portfolio_id)).await?;
        tx.commit().await?;
        Ok(positions)
    }

    /// A client's interactions, each with its sentiment results.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the client does not exist.
    pub async fn interaction_history(
        &self,
        client_id: i64,
    ) -> Result<Vec<InteractionWithSentiment>, CrmError> {
        let mut tx = self.pool.begin().await?;
        require(&mut tx, "client", "clients", client_id).await?;
        let history = history(&mut tx, client_id).await?;
        tx.commit().await?;
        Ok(history)
    }

    /// A portfolio with its positions. Account number unmasked.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the portfolio does not exist.
    pub async fn portfolio_holdings(
        &self,
        portfolio_id: i64,
    ) -> Result<PortfolioHoldings, CrmError> {
        let mut tx = self.pool.begin().await?;
        let portfolio = portfolios::fetch(&mut *tx, portfolio_id).await?;
        let positions =
            positions::collect(&mut *tx, &PositionFilter::in_portfolio(portfolio_id)).await?;
        tx.commit().await?;
        Ok(PortfolioHoldings {
            portfolio,
            positions,
        })
    }

    /// Everything stored about a client. Account numbers unmasked.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the client does not exist.
    pub async fn client_profile(&self, client_id: i64) -> Result<ClientProfile, CrmError> {
        let mut tx = self.pool.begin().await?;
        let profile = profile(&mut tx, client_id).await?;
        tx.commit().await?;
        Ok(profile)
    }

    /// Like [`Reports::client_profile`], also appending a `"view"` audit
    /// entry for the client in the same transaction.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the client does not exist.
    /// - [`CrmError::ForeignKey`] if `viewer_id` names a missing manager.
    pub async fn view_client_profile(
        &self,
        client_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<ClientProfile, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let profile = profile(&mut tx, client_id).await?;
        let entry = NewAuditLog::new(ACTION_VIEW)
            .by_manager(viewer_id)
            .on_client(client_id);
        audit_logs::append(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(profile)
    }
}

async fn require(
    conn: &mut SqliteConnection,
    entity: &'static str,
    table: &'static str,
    id: i64,
) -> Result<(), CrmError> {
    if exists(conn, table, id).await? {
        Ok(())
    } else {
        Err(CrmError::NotFound { entity, id })
    }
}

async fn history(
    conn: &mut SqliteConnection,
    client_id: i64,
) -> Result<Vec<InteractionWithSentiment>, CrmError> {
    let found = interactions::collect(&mut *conn, &InteractionFilter::for_client(client_id)).await?;
    let mut by_interaction: HashMap<i64, Vec<SentimentLog>> = HashMap::new();
    for log in sentiment_logs::collect_for_client(&mut *conn, client_id).await? {
        by_interaction.entry(log.interaction_id).or_default().push(log);
    }
    Ok(found
        .into_iter()
        .map(|interaction| InteractionWithSentiment {
            sentiment_logs: by_interaction.remove(&interaction.id).unwrap_or_default(),
            interaction,
        })
        .collect())
}

async fn profile(conn: &mut SqliteConnection, client_id: i64) -> Result<ClientProfile, CrmError> {
    let client = clients::fetch(&mut *conn, client_id).await?;

    let household = match client.household_id {
        Some(id) => Some(households::fetch(&mut *conn, id).await?),
        None => None,
    };
    let manager_email = match client.manager_id {
        Some(id) => Some(managers::fetch(&mut *conn, id).await?.email),
        None => None,
    };

    let goals = goals::collect(&mut *conn, &GoalFilter::for_client(client_id)).await?;

    let mut holdings = Vec::new();
    for portfolio in portfolios::collect(&mut *conn, &PortfolioFilter::for_client(client_id)).await?
    {
        let positions =
            positions::collect(&mut *conn, &PositionFilter::in_portfolio(portfolio.id)).await?;
        holdings.push(PortfolioHoldings {
            portfolio,
            positions,
        });
    }

    let interactions = history(conn, client_id).await?;
    let action_items =
        action_items::collect(&mut *conn, &ActionItemFilter::for_client(client_id)).await?;

    tracing::debug!(
        client_id,
        goals = goals.len(),
        portfolios = holdings.len(),
        interactions = interactions.len(),
        "client profile assembled"
    );

    Ok(ClientProfile {
        client,
        household,
        manager_email,
        goals,
        portfolios: holdings,
        interactions,
        action_items,
    })
}
