//! Individual holdings inside a portfolio.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, required_text};
use super::fixed_point::{COST_BASIS, POSITION_QUANTITY};
use crate::error::CrmError;

/// Longest accepted ticker symbol.
pub const MAX_TICKER_LEN: usize = 10;

/// Asset class of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    /// Stocks and equity funds.
    Equity,
    /// Bonds and other fixed-income instruments.
    FixedIncome,
    /// Cash and equivalents.
    Cash,
}

impl PositionType {
    /// Every accepted value, in storage form.
    pub const ALL: [Self; 3] = [Self::Equity, Self::FixedIncome, Self::Cash];

    /// Storage / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::FixedIncome => "fixed_income",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionType {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CrmError::validation(
                    "position_type",
                    format!("`{s}` is not one of equity, fixed_income, cash"),
                )
            })
    }
}

/// A stored position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    /// Surrogate identifier.
    pub id: i64,
    /// Owning portfolio.
    pub portfolio_id: i64,
    /// Upper-cased ticker symbol.
    pub ticker: String,
    /// Units held, four decimal places.
    #[schema(value_type = String, example = "12.5000")]
    pub quantity: Decimal,
    /// Original purchase value, two decimal places.
    #[schema(value_type = String, example = "1830.25")]
    pub cost_basis: Decimal,
    /// Asset class.
    pub position_type: PositionType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a [`Position`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPosition {
    /// Owning portfolio.
    pub portfolio_id: i64,
    /// Ticker symbol.
    pub ticker: String,
    /// Units held.
    #[schema(value_type = String, example = "12.5000")]
    pub quantity: Decimal,
    /// Original purchase value.
    #[schema(value_type = String, example = "1830.25")]
    pub cost_basis: Decimal,
    /// Asset class.
    pub position_type: PositionType,
}

impl NewPosition {
    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a malformed ticker or amounts
    /// outside their fixed-point columns.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            portfolio_id: self.portfolio_id,
            ticker: normalize_ticker(&self.ticker)?,
            quantity: POSITION_QUANTITY.normalize("quantity", self.quantity)?,
            cost_basis: COST_BASIS.normalize("cost_basis", self.cost_basis)?,
            position_type: self.position_type,
        })
    }
}

/// Partial update of a [`Position`]. The owning portfolio cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PositionPatch {
    /// New ticker.
    #[serde(default, deserialize_with = "non_null")]
    pub ticker: Option<String>,
    /// New quantity.
    #[serde(default, deserialize_with = "non_null")]
    #[schema(value_type = Option<String>)]
    pub quantity: Option<Decimal>,
    /// New cost basis.
    #[serde(default, deserialize_with = "non_null")]
    #[schema(value_type = Option<String>)]
    pub cost_basis: Option<Decimal>,
    /// New asset class.
    #[serde(default, deserialize_with = "non_null")]
    pub position_type: Option<PositionType>,
}

impl PositionPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for invalid replacement values.
    pub fn apply(self, mut current: Position) -> Result<Position, CrmError> {
        if let Some(ticker) = self.ticker {
            current.ticker = normalize_ticker(&ticker)?;
        }
        if let Some(quantity) = self.quantity {
            current.quantity = POSITION_QUANTITY.normalize("quantity", quantity)?;
        }
        if let Some(cost_basis) = self.cost_basis {
            current.cost_basis = COST_BASIS.normalize("cost_basis", cost_basis)?;
        }
        if let Some(position_type) = self.position_type {
            current.position_type = position_type;
        }
        Ok(current)
    }
}

/// List filter for positions.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct PositionFilter {
    /// Only positions in this portfolio.
    pub portfolio_id: Option<i64>,
    /// Only positions in this ticker (case-insensitive).
    pub ticker: Option<String>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

impl PositionFilter {
    /// Positions of one portfolio.
    #[must_use]
    pub fn in_portfolio(portfolio_id: i64) -> Self {
        Self {
            portfolio_id: Some(portfolio_id),
            ..Self::default()
        }
    }
}

fn normalize_ticker(raw: &str) -> Result<String, CrmError> {
    let ticker = required_text("ticker", raw)?.to_uppercase();
    if ticker.chars().count() > MAX_TICKER_LEN {
        return Err(CrmError::validation(
            "ticker",
            format!("at most {MAX_TICKER_LEN} characters"),
        ));
    }
    Ok(ticker)
}
