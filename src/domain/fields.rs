//! Shared field rules and list ordering.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::CrmError;

/// Ordering of list results by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Lowest identifier first.
    #[default]
    Asc,
    /// Highest identifier first.
    Desc,
}

impl SortOrder {
    /// SQL-side token bound into list queries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Trims `value` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns [`CrmError::Validation`] naming `field` for blank input.
pub fn required_text(field: &'static str, value: &str) -> Result<String, CrmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::validation(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Checks that `value` lies in `min..=max`.
///
/// # Errors
///
/// Returns [`CrmError::Validation`] naming `field` when out of range.
pub fn in_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<i32, CrmError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(CrmError::validation(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

/// Deserializes a patch field that distinguishes "absent" from `null`.
///
/// Used with `#[serde(default, deserialize_with = "nullable")]`: a missing
/// key stays `None`, an explicit `null` becomes `Some(None)`.
///
/// # Errors
///
/// Propagates the inner deserializer error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserializes a patch field that may be omitted but never cleared.
///
/// Used with `#[serde(default, deserialize_with = "non_null")]`: a missing
/// key stays `None`, an explicit `null` is rejected.
///
/// # Errors
///
/// Fails on `null` and propagates the inner deserializer error.
pub fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("must not be null"))
}
