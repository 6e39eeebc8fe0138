//! Database row models for events and generated content.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Event, EventId, GeneratedContent, UserId};

/// A row of the `events` table, with `user_id` selected as text.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    /// Primary key.
    pub id: Uuid,
    /// Owner UUID rendered as text.
    pub user_id: String,
    /// Display name.
    pub event_name: String,
    /// Category tag.
    pub event_type: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Calendar date.
    pub date: Option<NaiveDate>,
    /// Time of day.
    pub time: Option<NaiveTime>,
    /// Location string.
    pub location: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Venue category.
    pub venue_type: Option<String>,
    /// Expected attendee count.
    pub audience_size: Option<i32>,
    /// Duration descriptor.
    pub duration: Option<String>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Trigger-maintained modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            user_id: UserId::new(row.user_id),
            event_name: row.event_name,
            event_type: row.event_type,
            description: row.description,
            date: row.date,
            time: row.time,
            location: row.location,
            city: row.city,
            venue_type: row.venue_type,
            audience_size: row.audience_size,
            duration: row.duration,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of the `ai_generated_content` table.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning event.
    pub event_id: Uuid,
    /// Owner UUID rendered as text.
    pub user_id: String,
    /// Content category tag.
    pub content_type: String,
    /// Originating prompt.
    pub prompt: Option<String>,
    /// JSONB generated payload.
    pub generated_content: serde_json::Value,
    /// JSONB metadata.
    pub metadata: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Trigger-maintained modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ContentRow> for GeneratedContent {
    fn from(row: ContentRow) -> Self {
        Self {
            id: row.id,
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::new(row.user_id),
            content_type: row.content_type,
            prompt: row.prompt,
            generated_content: row.generated_content,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
