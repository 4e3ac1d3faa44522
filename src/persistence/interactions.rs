//! Interactions repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::cascade::{self, Parent};
use super::{DeletePolicy, ListQuery, begin_write, corrupt, require_parent};
use crate::domain::{Interaction, InteractionFilter, InteractionPatch, NewInteraction};
use crate::error::CrmError;

/// Access to the `interactions` table.
#[derive(Debug, Clone, Copy)]
pub struct Interactions<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Interactions<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Records an interaction with an existing client.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a blank `vector_id`.
    /// - [`CrmError::ForeignKey`] if the client does not exist.
    pub async fn create(&self, new: NewInteraction) -> Result<Interaction, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_parent(&mut tx, "interaction", "client", "clients", new.client_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO interactions (client_id, type, raw_content, vector_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
        )
        .bind(new.client_id)
        .bind(new.interaction_type.as_str())
        .bind(new.raw_content)
        .bind(new.vector_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let interaction = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            interaction_id = id,
            client_id = interaction.client_id,
            kind = %interaction.interaction_type,
            "interaction recorded"
        );
        Ok(interaction)
    }

    /// Fetches one interaction.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no interaction has this id.
    pub async fn get(&self, id: i64) -> Result<Interaction, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams interactions matching `filter`, ordered by id.
    pub fn list(
        &self,
        filter: &InteractionFilter,
    ) -> BoxStream<'a, Result<Interaction, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`Interactions::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(&self, filter: &InteractionFilter) -> Result<Vec<Interaction>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to interaction `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the interaction does not exist.
    /// - [`CrmError::Validation`] for a blank `vector_id`.
    pub async fn update(&self, id: i64, patch: InteractionPatch) -> Result<Interaction, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let interaction = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query("UPDATE interactions SET type = ?2, raw_content = ?3, vector_id = ?4 WHERE id = ?1")
            .bind(id)
            .bind(interaction.interaction_type.as_str())
            .bind(interaction.raw_content.as_deref())
            .bind(interaction.vector_id.as_deref())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(interaction_id = id, "interaction updated");
        Ok(interaction)
    }

    /// Deletes interaction `id`; under [`DeletePolicy::Cascade`] its
    /// sentiment logs go too.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the interaction does not exist.
    /// - [`CrmError::Conflict`] if sentiment logs exist under
    ///   [`DeletePolicy::Restrict`].
    pub async fn delete(&self, id: i64, policy: DeletePolicy) -> Result<(), CrmError> {
        cascade::delete(self.pool, Parent::Interaction, id, policy).await
    }
}

/// Reads every interaction matching `filter` through `executor`.
pub(crate) async fn collect<'e, E>(
    executor: E,
    filter: &InteractionFilter,
) -> Result<Vec<Interaction>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = list_query(filter).fetch_all(executor).await?;
    rows.iter().map(from_row).collect()
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Interaction, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, client_id, type, raw_content, vector_id, created_at \
         FROM interactions WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "interaction",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &InteractionFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, client_id, type, raw_content, vector_id, created_at FROM interactions \
         WHERE (?1 IS NULL OR client_id = ?1) \
         AND (?2 IS NULL OR vector_id = ?2) \
         ORDER BY CASE WHEN ?3 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.client_id)
    .bind(filter.vector_id.clone())
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<Interaction, CrmError> {
    let kind: &str = row.try_get("type")?;
    Ok(Interaction {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        interaction_type: kind.parse().map_err(|e| corrupt("type", &e))?,
        raw_content: row.try_get("raw_content")?,
        vector_id: row.try_get("vector_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{InteractionType, NewClient};
    use crate::persistence::Store;

    #[tokio::test]
    async fn lookup_by_vector_id() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(client) = store.clients().create(NewClient::new("Ada", "Park")).await else {
            panic!("client insert");
        };
        let mut call = NewInteraction::new(client.id, InteractionType::Call);
        call.vector_id = Some("vec-123".to_string());
        assert!(store.interactions().create(call).await.is_ok());
        assert!(
            store
                .interactions()
                .create(NewInteraction::new(client.id, InteractionType::Email))
                .await
                .is_ok()
        );

        let filter = InteractionFilter {
            vector_id: Some("vec-123".to_string()),
            ..InteractionFilter::default()
        };
        let Ok(found) = store.interactions().list_all(&filter).await else {
            panic!("list");
        };
        let [call] = found.as_slice() else {
            panic!("expected one match, got {}", found.len());
        };
        assert_eq!(call.interaction_type, InteractionType::Call);
    }
}
