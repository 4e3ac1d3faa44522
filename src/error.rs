//! CRM error types with HTTP status code mapping.
//!
//! [`CrmError`] is the single error type of the crate. The storage layer
//! raises it directly and the REST layer renders it as a structured JSON
//! body with a status code and a numeric error code.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid `priority`: must be between 1 and 10",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`CrmError::error_code`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error taxonomy of the schema and access layer.
///
/// # Error Code Ranges
///
/// | Range     | Category                 | HTTP Status                      |
/// |-----------|--------------------------|----------------------------------|
/// | 1000–1999 | Validation / references  | 400 Bad Request / 422            |
/// | 2000–2999 | State / Not Found        | 404 / 405 / 409                  |
/// | 3000–3999 | Server / Storage         | 500 / 503                        |
///
/// Data-integrity errors are never retried by this crate.
/// [`CrmError::StorageUnavailable`] is the only transient category and
/// callers are expected to retry it with backoff.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// A field is outside its allowed range or enumeration.
    #[error("invalid `{field}`: {reason}")]
    Validation {
        /// Offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A referenced parent row does not exist.
    #[error("{entity} references missing {parent} {id}")]
    ForeignKey {
        /// Entity being written.
        entity: &'static str,
        /// Referenced parent entity.
        parent: &'static str,
        /// Identifier that failed to resolve.
        id: i64,
    },

    /// The target of an operation does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Requested identifier.
        id: i64,
    },

    /// A delete was blocked by dependent rows.
    #[error("cannot delete {entity} {id}: {count} dependent {dependent} row(s) exist")]
    Conflict {
        /// Entity kind being deleted.
        entity: &'static str,
        /// Identifier being deleted.
        id: i64,
        /// Table holding the blocking rows.
        dependent: &'static str,
        /// Number of blocking rows.
        count: i64,
    },

    /// A unique column already holds the submitted value.
    #[error("duplicate {entity} `{field}`")]
    Duplicate {
        /// Entity kind.
        entity: &'static str,
        /// Unique field that collided.
        field: &'static str,
    },

    /// Attempted mutation of an immutable or append-only record.
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// The storage engine could not be reached.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CrmError {
    /// Shorthand for a [`CrmError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation { .. } => 1001,
            Self::ForeignKey { .. } => 1002,
            Self::NotFound { .. } => 2001,
            Self::Conflict { .. } => 2002,
            Self::Duplicate { .. } => 2003,
            Self::OperationNotAllowed(_) => 2004,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::StorageUnavailable(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::ForeignKey { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::OperationNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for failures worth retrying with backoff.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<sqlx::Error> for CrmError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StorageUnavailable(err.to_string())
            }
            sqlx::Error::Database(db) => {
                if db.code().as_deref().is_some_and(is_lock_contention) {
                    Self::StorageUnavailable(db.to_string())
                } else if db.is_unique_violation() {
                    Self::Duplicate {
                        entity: "record",
                        field: "unique key",
                    }
                } else if db.is_foreign_key_violation() {
                    Self::ForeignKey {
                        entity: "record",
                        parent: "parent",
                        id: 0,
                    }
                } else if db.is_check_violation() {
                    Self::validation("record", db.message().to_string())
                } else {
                    Self::Storage(db.to_string())
                }
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

/// SQLite result codes 5 (`BUSY`) and 6 (`LOCKED`), including their
/// extended forms such as 517 (`BUSY_SNAPSHOT`).
fn is_lock_contention(code: &str) -> bool {
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, 5 | 6))
}

impl From<JsonRejection> for CrmError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", rejection.body_text())
    }
}

impl From<QueryRejection> for CrmError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation("query", rejection.body_text())
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::Validation { field, .. } | Self::Duplicate { field, .. } => {
                Some(format!("field: {field}"))
            }
            Self::Conflict { dependent, .. } => Some(format!("dependent: {dependent}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_category() {
        assert_eq!(
            CrmError::validation("priority", "out of range").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CrmError::NotFound {
                entity: "client",
                id: 7
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CrmError::OperationNotAllowed("audit log is append-only".to_string()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            CrmError::StorageUnavailable("down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn only_storage_unavailable_is_transient() {
        assert!(CrmError::StorageUnavailable("timeout".to_string()).is_transient());
        assert!(
            !CrmError::Conflict {
                entity: "client",
                id: 1,
                dependent: "portfolios",
                count: 2
            }
            .is_transient()
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = CrmError::ForeignKey {
            entity: "goal",
            parent: "client",
            id: 42,
        };
        assert_eq!(err.to_string(), "goal references missing client 42");

        let err = CrmError::Conflict {
            entity: "portfolio",
            id: 3,
            dependent: "positions",
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "cannot delete portfolio 3: 2 dependent positions row(s) exist"
        );
    }

    #[test]
    fn busy_and_locked_codes_are_contention() {
        for code in ["5", "6", "261", "262", "517", "773"] {
            assert!(is_lock_contention(code), "code {code}");
        }
        for code in ["1", "19", "2067", "787", "not-a-code"] {
            assert!(!is_lock_contention(code), "code {code}");
        }
    }

    #[test]
    fn pool_timeout_maps_to_unavailable() {
        let err = CrmError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, CrmError::StorageUnavailable(_)));
        assert_eq!(err.error_code(), 3002);
    }
}
