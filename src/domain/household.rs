//! Households group related clients for joint reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, required_text};
use crate::error::CrmError;

/// A stored household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Household {
    /// Surrogate identifier.
    pub id: i64,
    /// Display name, e.g. `"Smith Family"`.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a [`Household`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHousehold {
    /// Display name.
    pub name: String,
}

impl NewHousehold {
    /// Creates an insert for the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank name.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            name: required_text("name", &self.name)?,
        })
    }
}

/// Partial update of a [`Household`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HouseholdPatch {
    /// New display name.
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
}

impl HouseholdPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank name.
    pub fn apply(self, mut current: Household) -> Result<Household, CrmError> {
        if let Some(name) = self.name {
            current.name = required_text("name", &name)?;
        }
        Ok(current)
    }
}

/// List filter for households.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct HouseholdFilter {
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}
