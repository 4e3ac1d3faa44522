//! Recorded contact with a client: emails, calls and voice notes.
//!
//! `vector_id` correlates a record with an entry in an external semantic
//! search index. Only the key is stored here, never the embedding.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::fields::{SortOrder, non_null, nullable};
use crate::error::CrmError;

/// Channel an interaction came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Email thread.
    Email,
    /// Phone or video call.
    Call,
    /// Recorded voice note.
    VoiceNote,
}

impl InteractionType {
    /// Every accepted value.
    pub const ALL: [Self; 3] = [Self::Email, Self::Call, Self::VoiceNote];

    /// Storage / wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Call => "call",
            Self::VoiceNote => "voice_note",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CrmError::validation("type", format!("`{s}` is not one of email, call, voice_note"))
            })
    }
}

/// A stored interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Interaction {
    /// Surrogate identifier.
    pub id: i64,
    /// Client the interaction was with.
    pub client_id: i64,
    /// Channel.
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    /// Raw body or transcript.
    pub raw_content: Option<String>,
    /// Key of the matching entry in the external search index.
    pub vector_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting an [`Interaction`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewInteraction {
    /// Client the interaction was with.
    pub client_id: i64,
    /// Channel.
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    /// Raw body or transcript.
    #[serde(default)]
    pub raw_content: Option<String>,
    /// Key of the matching entry in the external search index.
    #[serde(default)]
    pub vector_id: Option<String>,
}

impl NewInteraction {
    /// Creates an insert without content.
    #[must_use]
    pub fn new(client_id: i64, interaction_type: InteractionType) -> Self {
        Self {
            client_id,
            interaction_type,
            raw_content: None,
            vector_id: None,
        }
    }

    /// Sets the raw content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.raw_content = Some(content.into());
        self
    }

    /// Validates the fields.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank `vector_id`.
    pub fn validate(self) -> Result<Self, CrmError> {
        Ok(Self {
            vector_id: normalize_vector_id(self.vector_id)?,
            ..self
        })
    }
}

/// Partial update of an [`Interaction`]. The client cannot change.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InteractionPatch {
    /// New channel.
    #[serde(default, rename = "type", deserialize_with = "non_null")]
    pub interaction_type: Option<InteractionType>,
    /// New or cleared content.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub raw_content: Option<Option<String>>,
    /// New or cleared index key.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub vector_id: Option<Option<String>>,
}

impl InteractionPatch {
    /// Applies the patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] for a blank `vector_id`.
    pub fn apply(self, mut current: Interaction) -> Result<Interaction, CrmError> {
        if let Some(interaction_type) = self.interaction_type {
            current.interaction_type = interaction_type;
        }
        if let Some(raw_content) = self.raw_content {
            current.raw_content = raw_content;
        }
        if let Some(vector_id) = self.vector_id {
            current.vector_id = normalize_vector_id(vector_id)?;
        }
        Ok(current)
    }
}

/// List filter for interactions.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct InteractionFilter {
    /// Only interactions with this client.
    pub client_id: Option<i64>,
    /// Only the interaction carrying this index key.
    pub vector_id: Option<String>,
    /// Result ordering by id.
    #[param(inline)]
    pub order: SortOrder,
}

impl InteractionFilter {
    /// Interactions with one client.
    #[must_use]
    pub fn for_client(client_id: i64) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }
}

fn normalize_vector_id(vector_id: Option<String>) -> Result<Option<String>, CrmError> {
    match vector_id {
        Some(v) if v.trim().is_empty() => {
            Err(CrmError::validation("vector_id", "must not be blank when set"))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_uses_wire_name() {
        let json = serde_json::to_value(InteractionType::VoiceNote).ok();
        assert_eq!(json, Some(serde_json::json!("voice_note")));
        assert!("sms".parse::<InteractionType>().is_err());
        assert_eq!("call".parse::<InteractionType>().ok(), Some(InteractionType::Call));
    }

    #[test]
    fn new_interaction_reads_type_key() {
        let parsed: Result<NewInteraction, _> =
            serde_json::from_str(r#"{"client_id": 2, "type": "email", "raw_content": "hi"}"#);
        let parsed = parsed.ok();
        assert_eq!(
            parsed.as_ref().map(|i| i.interaction_type),
            Some(InteractionType::Email)
        );
    }

    #[test]
    fn blank_vector_id_is_rejected() {
        let mut new = NewInteraction::new(1, InteractionType::Call);
        new.vector_id = Some(" ".to_string());
        assert!(new.validate().is_err());
    }
}
