//! Append-only record of who did what to which client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, required_text};
use crate::error::CrmError;

/// A client record was opened.
pub const ACTION_VIEW: &str = "view";
/// A client report PDF was produced.
pub const ACTION_GENERATE_PDF: &str = "generate_pdf";

/// A stored audit entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    /// Surrogate identifier.
    pub id: i64,
    /// Acting manager; `None` for system-initiated actions.
    pub manager_id: Option<i64>,
    /// Affected client, if any.
    pub client_id: Option<i64>,
    /// Action label, e.g. `"view"`.
    pub action: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

/// Fields for appending an [`AuditLog`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAuditLog {
    /// Acting manager.
    #[serde(default)]
    pub manager_id: Option<i64>,
    /// Affected client.
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Action label.
    pub action: String,
}

impl NewAuditLog {
    /// Creates an entry for `action`.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            manager_id: None,
            client_id: None,
            action: action.into(),
        }
    }

    /// Sets the acting manager.
    #[must_use]
    pub fn by_manager(mut self, manager_id: Option<i64>) -> Self {
        self.manager_id = manager_id;
        self
    }

    /// Sets the affected client.
    #[must_use]
    pub fn on_client(mut self, client_id: i64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Validates the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank action.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            action: required_text("action", &self.action)?,
            ..self
        })
    }
}

/// List filter for audit entries.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct AuditLogFilter {
    /// Only entries by this manager.
    pub manager_id: Option<i64>,
    /// Only entries about this client.
    pub client_id: Option<i64>,
    /// Only entries with this action label.
    pub action: Option<String>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}
