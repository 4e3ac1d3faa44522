//! Sentiment logs repository.

use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{ListQuery, begin_write, require_parent};
use crate::domain::{NewSentimentLog, SentimentLog, SentimentLogFilter, SentimentLogPatch};
use crate::error::CrmError;

/// Access to the `sentiment_logs` table.
#[derive(Debug, Clone, Copy)]
pub struct SentimentLogs<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SentimentLogs<'a> {
    pub(crate) const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Records an analysis result for an existing interaction.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] for a score outside `[-1.0, 1.0]`.
    /// - [`CrmError::ForeignKey`] if the interaction does not exist.
    pub async fn create(&self, new: NewSentimentLog) -> Result<SentimentLog, CrmError> {
        let new = new.validate()?;
        let mut tx = begin_write(self.pool).await?;
        require_parent(
            &mut tx,
            "sentiment_log",
            "interaction",
            "interactions",
            new.interaction_id,
        )
        .await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sentiment_logs (interaction_id, sentiment_score, summary, created_at) \
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(new.interaction_id)
        .bind(new.sentiment_score)
        .bind(new.summary)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let log = fetch(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(
            sentiment_log_id = id,
            interaction_id = log.interaction_id,
            score = log.sentiment_score,
            "sentiment recorded"
        );
        Ok(log)
    }

    /// Fetches one sentiment log.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if no log has this id.
    pub async fn get(&self, id: i64) -> Result<SentimentLog, CrmError> {
        fetch(self.pool, id).await
    }

    /// Streams sentiment logs matching `filter`, ordered by id.
    pub fn list(
        &self,
        filter: &SentimentLogFilter,
    ) -> BoxStream<'a, Result<SentimentLog, CrmError>> {
        list_query(filter)
            .fetch(self.pool)
            .map(|row| row.map_err(CrmError::from).and_then(|r| from_row(&r)))
            .boxed()
    }

    /// Collects [`SentimentLogs::list`] into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first storage or decoding error.
    pub async fn list_all(
        &self,
        filter: &SentimentLogFilter,
    ) -> Result<Vec<SentimentLog>, CrmError> {
        self.list(filter).try_collect().await
    }

    /// Applies `patch` to sentiment log `id`.
    ///
    /// # Errors
    ///
    /// - [`CrmError::NotFound`] if the log does not exist.
    /// - [`CrmError::Validation`] for an out-of-range score.
    pub async fn update(
        &self,
        id: i64,
        patch: SentimentLogPatch,
    ) -> Result<SentimentLog, CrmError> {
        let mut tx = begin_write(self.pool).await?;
        let log = patch.apply(fetch(&mut *tx, id).await?)?;
        sqlx::query("UPDATE sentiment_logs SET sentiment_score = ?2, summary = ?3 WHERE id = ?1")
            .bind(id)
            .bind(log.sentiment_score)
            .bind(log.summary.as_deref())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(sentiment_log_id = id, "sentiment log updated");
        Ok(log)
    }

    /// Deletes sentiment log `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] if the log does not exist.
    pub async fn delete(&self, id: i64) -> Result<(), CrmError> {
        let result = sqlx::query("DELETE FROM sentiment_logs WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CrmError::NotFound {
                entity: "sentiment_log",
                id,
            });
        }
        tracing::info!(sentiment_log_id = id, "sentiment log deleted");
        Ok(())
    }
}

/// Reads every sentiment log attached to any interaction of `client_id`,
/// ordered by interaction then id.
pub(crate) async fn collect_for_client<'e, E>(
    executor: E,
    client_id: i64,
) -> Result<Vec<SentimentLog>, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "SELECT s.id, s.interaction_id, s.sentiment_score, s.summary, s.created_at \
         FROM sentiment_logs s JOIN interactions i ON i.id = s.interaction_id \
         WHERE i.client_id = ?1 ORDER BY s.interaction_id, s.id",
    )
    .bind(client_id)
    .fetch_all(executor)
    .await?;
    rows.iter().map(from_row).collect()
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<SentimentLog, CrmError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, interaction_id, sentiment_score, summary, created_at \
         FROM sentiment_logs WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(CrmError::NotFound {
        entity: "sentiment_log",
        id,
    })?;
    from_row(&row)
}

fn list_query(filter: &SentimentLogFilter) -> ListQuery {
    sqlx::query(
        "SELECT id, interaction_id, sentiment_score, summary, created_at FROM sentiment_logs \
         WHERE (?1 IS NULL OR interaction_id = ?1) \
         ORDER BY CASE WHEN ?2 = 'desc' THEN -id ELSE id END",
    )
    .bind(filter.interaction_id)
    .bind(filter.order.as_str())
}

fn from_row(row: &SqliteRow) -> Result<SentimentLog, CrmError> {
    Ok(SentimentLog {
        id: row.try_get("id")?,
        interaction_id: row.try_get("interaction_id")?,
        sentiment_score: row.try_get("sentiment_score")?,
        summary: row.try_get("summary")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{InteractionType, NewClient, NewInteraction};
    use crate::persistence::Store;

    #[tokio::test]
    async fn score_bounds_are_inclusive() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let Ok(client) = store.clients().create(NewClient::new("Ada", "Park")).await else {
            panic!("client insert");
        };
        let Ok(interaction) = store
            .interactions()
            .create(NewInteraction::new(client.id, InteractionType::Call))
            .await
        else {
            panic!("interaction insert");
        };

        for score in [-1.0, 0.0, 1.0] {
            let created = store
                .sentiment_logs()
                .create(NewSentimentLog::new(interaction.id, score))
                .await;
            assert!(created.is_ok(), "score {score} rejected");
        }
        let result = store
            .sentiment_logs()
            .create(NewSentimentLog::new(interaction.id, 1.01))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::Validation {
                field: "sentiment_score",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn missing_interaction_is_a_foreign_key_error() {
        let Ok(store) = Store::in_memory().await else {
            panic!("in-memory store");
        };
        let result = store
            .sentiment_logs()
            .create(NewSentimentLog::new(12, 0.5))
            .await;
        assert!(matches!(
            result,
            Err(CrmError::ForeignKey {
                parent: "interaction",
                ..
            })
        ));
    }
}
