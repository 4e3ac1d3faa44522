//! Investment accounts held by a client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, required_text};
use super::fixed_point::PORTFOLIO_VALUE;
use crate::error::CrmError;

/// Number of trailing account-number characters left visible by
/// [`mask_account_number`].
pub const VISIBLE_SUFFIX: usize = 4;

/// A stored portfolio.
///
/// `account_number` is sensitive. Anything shown to a user should go
/// through [`Portfolio::masked`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Portfolio {
    /// Surrogate identifier.
    pub id: i64,
    /// Owning client.
    pub client_id: i64,
    /// Custodian account number, unique across portfolios.
    pub account_number: String,
    /// Reported total value, two decimal places.
    #[schema(value_type = String, example = "125000.00")]
    pub total_value: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    /// Returns a copy with the account number masked.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.account_number = mask_account_number(&self.account_number);
        self
    }
}

/// Replaces all but the last [`VISIBLE_SUFFIX`] characters with `*`.
///
/// Values no longer than the suffix are masked completely.
#[must_use]
pub fn mask_account_number(account_number: &str) -> String {
    let len = account_number.chars().count();
    if len <= VISIBLE_SUFFIX {
        return "*".repeat(len);
    }
    let hidden = len - VISIBLE_SUFFIX;
    account_number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

/// Fields for inserting a [`Portfolio`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPortfolio {
    /// Owning client.
    pub client_id: i64,
    /// Custodian account number.
    pub account_number: String,
    /// Reported total value; zero when omitted.
    #[serde(default)]
    #[schema(value_type = String, example = "125000.00")]
    pub total_value: Decimal,
}

impl NewPortfolio {
    /// Creates an empty portfolio insert.
    #[must_use]
    pub fn new(client_id: i64, account_number: impl Into<String>) -> Self {
        Self {
            client_id,
            account_number: account_number.into(),
            total_value: Decimal::ZERO,
        }
    }

    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank account number or a
    /// value that does not fit NUMERIC(15, 2).
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            client_id: self.client_id,
            account_number: required_text("account_number", &self.account_number)?,
            total_value: PORTFOLIO_VALUE.normalize("total_value", self.total_value)?,
        })
    }
}

/// Partial update of a [`Portfolio`]. The owning client cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PortfolioPatch {
    /// New account number.
    #[serde(default, deserialize_with = "non_null")]
    pub account_number: Option<String>,
    /// New total value.
    #[serde(default, deserialize_with = "non_null")]
    #[schema(value_type = Option<String>)]
    pub total_value: Option<Decimal>,
}

impl PortfolioPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for invalid replacement values.
    pub fn apply(self, mut current: Portfolio) -> Result<Portfolio, CrmError> {
        if let Some(account_number) = self.account_number {
            current.account_number = required_text("account_number", &account_number)?;
        }
        if let Some(total_value) = self.total_value {
            current.total_value = PORTFOLIO_VALUE.normalize("total_value", total_value)?;
        }
        Ok(current)
    }
}

/// List filter for portfolios.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct PortfolioFilter {
    /// Only portfolios of this client.
    pub client_id: Option<i64>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

impl PortfolioFilter {
    /// Portfolios of one client.
    #[must_use]
    pub fn for_client(client_id: i64) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_suffix() {
        assert_eq!(mask_account_number("123456789"), "*****6789");
        assert_eq!(mask_account_number("ACC-0042"), "****0042");
    }

    #[test]
    fn short_numbers_are_fully_masked() {
        assert_eq!(mask_account_number("1234"), "****");
        assert_eq!(mask_account_number(""), "");
    }

    #[test]
    fn masked_keeps_other_fields() {
        let p = Portfolio {
            id: 9,
            client_id: 3,
            account_number: "9988776655".to_string(),
            total_value: Decimal::new(100_000, 2),
            created_at: Utc::now(),
        };
        let m = p.clone().masked();
        assert_eq!(m.account_number, "******6655");
        assert_eq!(m.total_value, p.total_value);
        assert_eq!(m.id, p.id);
    }
}
