//! Financial goals a client is saving towards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, in_range, non_null, nullable};
use super::fixed_point::GOAL_AMOUNT;
use crate::error::CrmError;

/// Priority assigned when none is given.
pub const DEFAULT_PRIORITY: i32 = 5;
/// Lowest accepted priority.
pub const MIN_PRIORITY: i32 = 1;
/// Highest accepted priority.
pub const MAX_PRIORITY: i32 = 10;

/// A stored goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Goal {
    /// Surrogate identifier.
    pub id: i64,
    /// Owning client.
    pub client_id: i64,
    /// Amount to reach, two decimal places.
    #[schema(value_type = String, example = "500000.00")]
    pub target_amount: Decimal,
    /// When the amount should be reached.
    pub target_date: Option<DateTime<Utc>>,
    /// Free-text description.
    pub description: Option<String>,
    /// Priority on a 1–10 scale.
    pub priority: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a [`Goal`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewGoal {
    /// Owning client.
    pub client_id: i64,
    /// Amount to reach.
    #[schema(value_type = String, example = "500000.00")]
    pub target_amount: Decimal,
    /// When the amount should be reached.
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority on a 1–10 scale.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl NewGoal {
    /// Creates an insert with the default priority.
    #[must_use]
    pub fn new(client_id: i64, target_amount: Decimal) -> Self {
        Self {
            client_id,
            target_amount,
            target_date: None,
            description: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for an out-of-range priority or an
    /// amount that does not fit NUMERIC(12, 2).
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            target_amount: GOAL_AMOUNT.normalize("target_amount", self.target_amount)?,
            priority: in_range("priority", self.priority, MIN_PRIORITY, MAX_PRIORITY)?,
            ..self
        })
    }
}

/// Partial update of a [`Goal`]. The owning client cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GoalPatch {
    /// New target amount.
    #[serde(default, deserialize_with = "non_null")]
    #[schema(value_type = Option<String>)]
    pub target_amount: Option<Decimal>,
    /// New or cleared target date.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub target_date: Option<Option<DateTime<Utc>>>,
    /// New or cleared description.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// New priority.
    #[serde(default, deserialize_with = "non_null")]
    pub priority: Option<i32>,
}

impl GoalPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for invalid replacement values.
    pub fn apply(self, mut current: Goal) -> Result<Goal, CrmError> {
        if let Some(amount) = self.target_amount {
            current.target_amount = GOAL_AMOUNT.normalize("target_amount", amount)?;
        }
        if let Some(target_date) = self.target_date {
            current.target_date = target_date;
        }
        if let Some(description) = self.description {
            current.description = description;
        }
        if let Some(priority) = self.priority {
            current.priority = in_range("priority", priority, MIN_PRIORITY, MAX_PRIORITY)?;
        }
        Ok(current)
    }
}

/// List filter for goals.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct GoalFilter {
    /// Only goals of this client.
    pub client_id: Option<i64>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

impl GoalFilter {
    /// Goals of one client.
    #[must_use]
    pub fn for_client(client_id: i64) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }
}
