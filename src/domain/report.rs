//! Composite read models assembled from several tables.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    ActionItem, Client, Goal, Household, Interaction, Portfolio, Position, SentimentLog,
};

/// An interaction together with every sentiment result recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InteractionWithSentiment {
    /// The interaction.
    pub interaction: Interaction,
    /// Sentiment results, oldest first.
    pub sentiment_logs: Vec<SentimentLog>,
}

/// A portfolio with its positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PortfolioHoldings {
    /// The portfolio.
    pub portfolio: Portfolio,
    /// Positions, oldest first.
    pub positions: Vec<Position>,
}

impl PortfolioHoldings {
    /// Masks the portfolio's account number.
    #[must_use]
    pub fn masked(self) -> Self {
        Self {
            portfolio: self.portfolio.masked(),
            positions: self.positions,
        }
    }
}

/// Everything the CRM knows about one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientProfile {
    /// The client.
    pub client: Client,
    /// Owning household, if assigned.
    pub household: Option<Household>,
    /// Email of the advising manager, if assigned.
    pub manager_email: Option<String>,
    /// Goals, oldest first.
    pub goals: Vec<Goal>,
    /// Portfolios with their positions.
    pub portfolios: Vec<PortfolioHoldings>,
    /// Interactions with their sentiment results.
    pub interactions: Vec<InteractionWithSentiment>,
    /// Follow-up items.
    pub action_items: Vec<ActionItem>,
}

impl ClientProfile {
    /// Masks every account number in the profile.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.portfolios = self
            .portfolios
            .into_iter()
            .map(PortfolioHoldings::masked)
            .collect();
        self
    }
}
