//! Stored output of the external sentiment analysis of an interaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, nullable};
use crate::error::CrmError;

/// Most negative accepted score.
pub const MIN_SCORE: f64 = -1.0;
/// Most positive accepted score.
pub const MAX_SCORE: f64 = 1.0;

/// A stored sentiment result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentLog {
    /// Surrogate identifier.
    pub id: i64,
    /// Analysed interaction.
    pub interaction_id: i64,
    /// Score in `[-1.0, 1.0]`.
    pub sentiment_score: f64,
    /// Summary produced by the analyser.
    pub summary: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a [`SentimentLog`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSentimentLog {
    /// Analysed interaction.
    pub interaction_id: i64,
    /// Score in `[-1.0, 1.0]`.
    pub sentiment_score: f64,
    /// Summary produced by the analyser.
    #[serde(default)]
    pub summary: Option<String>,
}

impl NewSentimentLog {
    /// Creates an insert without a summary.
    #[must_use]
    pub fn new(interaction_id: i64, sentiment_score: f64) -> Self {
        Self {
            interaction_id,
            sentiment_score,
            summary: None,
        }
    }

    /// Validates the score.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] when the score is not a finite
    /// number in `[-1.0, 1.0]`.
    pub fn validate(self) -> Result<Self, CrmError> {
        check_score(self.sentiment_score)?;
        Ok(self)
    }
}

/// Partial update of a [`SentimentLog`]. The interaction cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SentimentLogPatch {
    /// New score.
    #[serde(default, deserialize_with = "non_null")]
    pub sentiment_score: Option<f64>,
    /// New or cleared summary.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub summary: Option<Option<String>>,
}

impl SentimentLogPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for an out-of-range score.
    pub fn apply(self, mut current: SentimentLog) -> Result<SentimentLog, CrmError> {
        if let Some(score) = self.sentiment_score {
            current.sentiment_score = check_score(score)?;
        }
        if let Some(summary) = self.summary {
            current.summary = summary;
        }
        Ok(current)
    }
}

/// List filter for sentiment logs.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct SentimentLogFilter {
    /// Only logs of this interaction.
    pub interaction_id: Option<i64>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

fn check_score(score: f64) -> Result<f64, CrmError> {
    if score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(CrmError::validation(
            "sentiment_score",
            format!("must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bounds() {
        for ok in [0.0, -1.0, 1.0, 0.35] {
            assert!(NewSentimentLog::new(1, ok).validate().is_ok(), "{ok}");
        }
        for bad in [1.5, -2.0, f64::NAN, f64::INFINITY] {
            assert!(NewSentimentLog::new(1, bad).validate().is_err(), "{bad}");
        }
    }
}
