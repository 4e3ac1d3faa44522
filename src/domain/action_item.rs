//! Follow-up tasks suggested for a client.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, nullable};
use crate::error::CrmError;

/// Progress of an action item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Not done yet.
    #[default]
    Pending,
    /// Done.
    Completed,
}

impl ActionStatus {
    /// Every accepted value.
    pub const ALL: [Self; 2] = [Self::Pending, Self::Completed];

    /// Storage / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CrmError::validation("status", format!("`{s}` is not one of pending, completed"))
            })
    }
}

/// A stored action item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionItem {
    /// Surrogate identifier.
    pub id: i64,
    /// Client the action concerns.
    pub client_id: i64,
    /// Progress.
    pub status: ActionStatus,
    /// Why an automated process suggested the action.
    pub ai_rationale: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting an [`ActionItem`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewActionItem {
    /// Client the action concerns.
    pub client_id: i64,
    /// Initial progress; pending when omitted.
    #[serde(default)]
    pub status: ActionStatus,
    /// Why the action was suggested.
    #[serde(default)]
    pub ai_rationale: Option<String>,
}

impl NewActionItem {
    /// Creates a pending item.
    #[must_use]
    pub fn new(client_id: i64, ai_rationale: impl Into<String>) -> Self {
        Self {
            client_id,
            status: ActionStatus::Pending,
            ai_rationale: Some(ai_rationale.into()),
        }
    }
}

/// Partial update of an [`ActionItem`]. The client cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ActionItemPatch {
    /// New progress.
    #[serde(default, deserialize_with = "non_null")]
    pub status: Option<ActionStatus>,
    /// New or cleared rationale.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub ai_rationale: Option<Option<String>>,
}

impl ActionItemPatch {
    /// Applies the patch to `current`.
    #[must_use]
    pub fn apply(self, mut current: ActionItem) -> ActionItem {
        if let Some(status) = self.status {
            current.status = status;
        }
        if let Some(ai_rationale) = self.ai_rationale {
            current.ai_rationale = ai_rationale;
        }
        current
    }
}

/// List filter for action items.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ActionItemFilter {
    /// Only items of this client.
    pub client_id: Option<i64>,
    /// Only items in this state.
    #[param(inline)]
    pub status: Option<ActionStatus>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

impl ActionItemFilter {
    /// Items of one client.
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
    fn status_defaults_to_pending() {
        let parsed: Result<NewActionItem, _> = serde_json::from_str(r#"{"client_id": 5}"#);
        assert_eq!(parsed.ok().map(|a| a.status), Some(ActionStatus::Pending));
    }

    #[test]
    fn status_rejects_unknown() {
        assert!("Pending".parse::<ActionStatus>().is_err());
        assert_eq!(
            "completed".parse::<ActionStatus>().ok(),
            Some(ActionStatus::Completed)
        );
    }
}
