//! PostgreSQL implementation of the relational store.
//!
//! Every statement runs in a transaction that first sets
//! `app.current_user_id`, which the row-level security policies in
//! `migrations/` compare against `user_id`. Ownership filtering is left
//! to those policies.

use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};

use super::models::{ContentRow, EventRow};
use crate::domain::{
    Event, EventId, EventPatch, GeneratedContent, NewEvent, NewGeneratedContent, UserId,
};
use crate::error::PlannerError;

const EVENT_COLUMNS: &str = "id, user_id::text AS user_id, event_name, event_type, description, \
     date, time, location, city, venue_type, audience_size, duration, created_at, updated_at";

const CONTENT_COLUMNS: &str = "id, event_id, user_id::text AS user_id, content_type, prompt, \
     generated_content, metadata, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `SELECT 1` within `timeout`. `true` only if it completes.
    pub async fn ping(&self, timeout: Duration) -> bool {
        let query = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(timeout, query).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "database unreachable");
                false
            }
            Err(_) => {
                tracing::debug!(timeout_ms = timeout.as_millis(), "database ping timed out");
                false
            }
        }
    }

    /// Opens a transaction scoped to `owner` for row-level security.
    async fn begin_as(&self, owner: &UserId) -> Result<Transaction<'static, Postgres>, PlannerError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('app.current_user_id', $1, true)")
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Lists the owner's events, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure.
    pub async fn list_events(&self, owner: &UserId) -> Result<Vec<Event>, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Fetches one event visible to the owner.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure.
    pub async fn get_event(
        &self,
        owner: &UserId,
        id: EventId,
    ) -> Result<Option<Event>, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row.map(Event::from))
    }

    /// Inserts an event and returns the stored row, with the id and
    /// timestamps assigned by column defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure,
    /// including an owner id that is not a UUID.
    pub async fn insert_event(&self, owner: &UserId, new: &NewEvent) -> Result<Event, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!(
            "INSERT INTO events (user_id, event_name, event_type, description, date, time, \
             location, city, venue_type, audience_size, duration) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(owner.as_str())
            .bind(&new.event_name)
            .bind(&new.event_type)
            .bind(&new.description)
            .bind(new.date)
            .bind(new.time)
            .bind(&new.location)
            .bind(&new.city)
            .bind(&new.venue_type)
            .bind(new.audience_size)
            .bind(&new.duration)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    /// Applies a partial update. `updated_at` is set by the table trigger.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::EventNotFound`] if no visible row matches,
    /// or a [`PlannerError::Persistence`] on database failure.
    pub async fn update_event(
        &self,
        owner: &UserId,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<Event, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!(
            "UPDATE events SET \
             event_name = COALESCE($2, event_name), \
             event_type = COALESCE($3, event_type), \
             description = COALESCE($4, description), \
             date = COALESCE($5, date), \
             time = COALESCE($6, time), \
             location = COALESCE($7, location), \
             city = COALESCE($8, city), \
             venue_type = COALESCE($9, venue_type), \
             audience_size = COALESCE($10, audience_size), \
             duration = COALESCE($11, duration) \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(*id.as_uuid())
            .bind(&patch.event_name)
            .bind(&patch.event_type)
            .bind(&patch.description)
            .bind(patch.date)
            .bind(patch.time)
            .bind(&patch.location)
            .bind(&patch.city)
            .bind(&patch.venue_type)
            .bind(patch.audience_size)
            .bind(&patch.duration)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        row.map(Event::from).ok_or(PlannerError::EventNotFound(id))
    }

    /// Deletes an event; its generated content goes with it by cascade.
    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure.
    pub async fn delete_event(&self, owner: &UserId, id: EventId) -> Result<bool, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores generated content for one of the owner's events.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure,
    /// including a reference to an event the owner cannot see.
    pub async fn insert_content(
        &self,
        owner: &UserId,
        new: &NewGeneratedContent,
    ) -> Result<GeneratedContent, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!(
            "INSERT INTO ai_generated_content \
             (event_id, user_id, content_type, prompt, generated_content, metadata) \
             VALUES ($1, $2::uuid, $3, $4, $5, $6) RETURNING {CONTENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(*new.event_id.as_uuid())
            .bind(owner.as_str())
            .bind(&new.content_type)
            .bind(&new.prompt)
            .bind(&new.generated_content)
            .bind(&new.metadata)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    /// Lists content generated for an event, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`PlannerError::Persistence`] on database failure.
    pub async fn list_content(
        &self,
        owner: &UserId,
        event_id: EventId,
    ) -> Result<Vec<GeneratedContent>, PlannerError> {
        let mut tx = self.begin_as(owner).await?;
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM ai_generated_content \
             WHERE event_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ContentRow>(&sql)
            .bind(*event_id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(GeneratedContent::from).collect())
    }
}
