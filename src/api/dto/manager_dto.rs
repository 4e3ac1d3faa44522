//! Manager DTOs. Requests carry a plaintext password; responses never
//! carry the stored hash.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::credentials::hash_password;
use crate::domain::fields::non_null;
use crate::domain::{Manager, ManagerPatch, NewManager};
use crate::error::CrmError;

/// Request body for `POST /managers`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct CreateManagerRequest {
    /// Login email.
    #[schema(example = "advisor@firm.example")]
    pub email: String,
    /// Plaintext password; only its hash is stored.
    pub password: String,
    /// Role label. Defaults to `"Junior Advisor"`.
    #[serde(default)]
    pub role: Option<String>,
}

impl fmt::Debug for CreateManagerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateManagerRequest")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl CreateManagerRequest {
    /// Hashes the password and builds the insert.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for an empty password.
    pub fn into_new_manager(self) -> Result<NewManager, CrmError> {
        Ok(NewManager {
            email: self.email,
            password_hash: hash_password(&self.password)?,
            role: self.role,
        })
    }
}

/// Request body for `PATCH /managers/{id}`.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct UpdateManagerRequest {
    /// New login email.
    #[serde(default, deserialize_with = "non_null")]
    pub email: Option<String>,
    /// New plaintext password.
    #[serde(default, deserialize_with = "non_null")]
    pub password: Option<String>,
    /// New role label.
    #[serde(default, deserialize_with = "non_null")]
    pub role: Option<String>,
}

impl fmt::Debug for UpdateManagerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateManagerRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

impl UpdateManagerRequest {
    /// Hashes a replacement password, if any, and builds the patch.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for an empty replacement password.
    pub fn into_patch(self) -> Result<ManagerPatch, CrmError> {
        Ok(ManagerPatch {
            email: self.email,
            password_hash: self.password.as_deref().map(hash_password).transpose()?,
            role: self.role,
        })
    }
}

/// Manager as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManagerDto {
    /// Surrogate identifier.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Role label.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Manager> for ManagerDto {
    fn from(manager: Manager) -> Self {
        Self {
            id: manager.id,
            email: manager.email,
            role: manager.role,
            created_at: manager.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_request_hashes_password() {
        let request = CreateManagerRequest {
            email: "a@firm.example".to_string(),
            password: "s3cret".to_string(),
            role: None,
        };
        let Ok(new) = request.into_new_manager() else {
            panic!("conversion failed");
        };
        assert_ne!(new.password_hash, "s3cret");
        assert!(new.password_hash.starts_with("$argon2"));
    }

    #[test]
    fn debug_omits_password() {
        let request = UpdateManagerRequest {
            password: Some("hunter2".to_string()),
            ..UpdateManagerRequest::default()
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
