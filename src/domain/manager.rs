//! Advisers who own client relationships.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use super::fields::{SortOrder, required_text};
use crate::error::CrmError;

/// Role assigned to a manager when none is given.
pub const DEFAULT_ROLE: &str = "Junior Advisor";

/// A stored adviser account.
///
/// The password hash is an opaque PHC string and is left out
/// of `Debug` output. API responses go through
/// [`crate::api::dto::ManagerDto`], which omits it entirely.
#[derive(Clone, PartialEq, Eq)]
pub struct Manager {
    /// Surrogate identifier.
    pub id: i64,
    /// Login email, unique and stored lower-cased.
    pub email: String,
    /// Opaque credential hash.
    pub password_hash: String,
    /// Free-text role label.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields for inserting a [`Manager`].
#[derive(Clone)]
pub struct NewManager {
    /// Login email.
    pub email: String,
    /// Credential hash produced by [`crate::credentials::hash_password`].
    pub password_hash: String,
    /// Role label; [`DEFAULT_ROLE`] when `None`.
    pub role: Option<String>,
}

impl fmt::Debug for NewManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewManager")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl NewManager {
    /// Creates an insert with the default role.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role: None,
        }
    }

    /// Validates and normalizes the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a malformed email or a blank
    /// hash or role.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            email: normalize_email(&self.email)?,
            password_hash: required_text("password_hash", &self.password_hash)?,
            role: Some(required_text(
                "role",
                self.role.as_deref().unwrap_or(DEFAULT_ROLE),
            )?),
        })
    }
}

/// Partial update of a [`Manager`].
#[derive(Clone, Default)]
pub struct ManagerPatch {
    /// New email.
    pub email: Option<String>,
    /// New credential hash.
    pub password_hash: Option<String>,
    /// New role label.
    pub role: Option<String>,
}

impl fmt::Debug for ManagerPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerPatch")
            .field("email", &self.email)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

impl ManagerPatch {
    /// Applies the patch to `current`, re-validating changed fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for invalid replacement values.
    pub fn apply(self, mut current: Manager) -> Result<Manager, CrmError> {
        if let Some(email) = self.email {
            current.email = normalize_email(&email)?;
        }
        if let Some(hash) = self.password_hash {
            current.password_hash = required_text("password_hash", &hash)?;
        }
        if let Some(role) = self.role {
            current.role = required_text("role", &role)?;
        }
        Ok(current)
    }
}

/// List filter for managers.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ManagerFilter {
    /// Only managers with exactly this role.
    pub role: Option<String>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

/// Trims and lower-cases an email, requiring a local part and a domain.
fn normalize_email(raw: &str) -> Result<String, CrmError> {
    let email = required_text("email", raw)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(CrmError::validation("email", "must look like user@domain")),
    }
}
