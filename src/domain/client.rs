//! Clients: the people a manager advises.
//!
//! Clients are soft-deleted by clearing `is_active`; hard deletes are
//! reserved for records created in error and are subject to the delete
//! policy in [`crate::persistence::DeletePolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, nullable, required_text};
use crate::error::CrmError;

/// A stored client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Client {
    /// Surrogate identifier.
    pub id: i64,
    /// Owning household, if assigned.
    pub household_id: Option<i64>,
    /// Advising manager, if assigned.
    pub manager_id: Option<i64>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Risk tolerance score.
    pub risk_score: Option<i32>,
    /// Free-text investment goal.
    pub investment_goal: Option<String>,
    /// `false` once the client has been deactivated.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// `"First Last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for inserting a [`Client`]. New clients are always active.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewClient {
    /// Owning household.
    #[serde(default)]
    pub household_id: Option<i64>,
    /// Advising manager.
    #[serde(default)]
    pub manager_id: Option<i64>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Risk tolerance score.
    #[serde(default)]
    pub risk_score: Option<i32>,
    /// Free-text investment goal.
    #[serde(default)]
    pub investment_goal: Option<String>,
}

impl NewClient {
    /// Creates an unassigned client with only a name.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            household_id: None,
            manager_id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            risk_score: None,
            investment_goal: None,
        }
    }

    /// Sets the owning household.
    #[must_use]
    pub fn in_household(mut self, household_id: i64) -> Self {
        self.household_id = Some(household_id);
        self
    }

    /// Sets the advising manager.
    #[must_use]
    pub fn managed_by(mut self, manager_id: i64) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for blank names.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            first_name: required_text("first_name", &self.first_name)?,
            last_name: required_text("last_name", &self.last_name)?,
            ..self
        })
    }
}

/// Partial update of a [`Client`].
///
/// For nullable fields an explicit JSON `null` clears the value while an
/// absent key leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClientPatch {
    /// Reassign or clear the household.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub household_id: Option<Option<i64>>,
    /// Reassign or clear the manager.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub manager_id: Option<Option<i64>>,
    /// New given name.
    #[serde(default, deserialize_with = "non_null")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(default, deserialize_with = "non_null")]
    pub last_name: Option<String>,
    /// New or cleared risk score.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub risk_score: Option<Option<i32>>,
    /// New or cleared investment goal.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub investment_goal: Option<Option<String>>,
    /// Activate or deactivate.
    #[serde(default, deserialize_with = "non_null")]
    pub is_active: Option<bool>,
}

impl ClientPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for blank names.
    pub fn apply(self, mut current: Client) -> Result<Client, CrmError> {
        if let Some(household_id) = self.household_id {
            current.household_id = household_id;
        }
        if let Some(manager_id) = self.manager_id {
            current.manager_id = manager_id;
        }
        if let Some(first_name) = self.first_name {
            current.first_name = required_text("first_name", &first_name)?;
        }
        if let Some(last_name) = self.last_name {
            current.last_name = required_text("last_name", &last_name)?;
        }
        if let Some(risk_score) = self.risk_score {
            current.risk_score = risk_score;
        }
        if let Some(investment_goal) = self.investment_goal {
            current.investment_goal = investment_goal;
        }
        if let Some(is_active) = self.is_active {
            current.is_active = is_active;
        }
        Ok(current)
    }
}

/// List filter for clients.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ClientFilter {
    /// Only clients in this household.
    pub household_id: Option<i64>,
    /// Only clients of this manager.
    pub manager_id: Option<i64>,
    /// Only active (`true`) or deactivated (`false`) clients.
    pub active: Option<bool>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn jane() -> Client {
        Client {
            id: 1,
            household_id: Some(2),
            manager_id: None,
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            risk_score: Some(4),
            investment_goal: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_null_clears_household() {
        let Ok(patch) = serde_json::from_str::<ClientPatch>(r#"{"household_id": null}"#) else {
            panic!("patch parse failed");
        };
        let Ok(updated) = patch.apply(jane()) else {
            panic!("patch rejected");
        };
        assert_eq!(updated.household_id, None);
        assert_eq!(updated.risk_score, Some(4));
    }

    #[test]
    fn blank_name_is_rejected() {
        let patch = ClientPatch {
            last_name: Some("  ".to_string()),
            ..ClientPatch::default()
        };
        assert!(patch.apply(jane()).is_err());
        assert!(NewClient::new("", "Smith").validate().is_err());
    }
}
