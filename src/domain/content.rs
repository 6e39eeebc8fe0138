//! AI-generated planning content attached to an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, UserId};

/// Content type used when none is given.
pub const DEFAULT_CONTENT_TYPE: &str = "event_plan";

/// A piece of generated content. Deleted together with its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedContent {
    /// Unique content identifier.
    pub id: uuid::Uuid,
    /// Event the content belongs to.
    pub event_id: EventId,
    /// Owning user.
    pub user_id: UserId,
    /// Content category tag (default `"event_plan"`).
    pub content_type: String,
    /// Prompt the content was generated from.
    pub prompt: Option<String>,
    /// Generated payload, arbitrary JSON.
    pub generated_content: serde_json::Value,
    /// Generation metadata, arbitrary JSON.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for storing generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewGeneratedContent {
    /// Event the content belongs to.
    pub event_id: EventId,
    /// Content category tag.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Prompt the content was generated from.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Generated payload.
    pub generated_content: serde_json::Value,
    /// Generation metadata.
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

impl NewGeneratedContent {
    /// Creates content of the default type with empty metadata.
    #[must_use]
    pub fn new(event_id: EventId, generated_content: serde_json::Value) -> Self {
        Self {
            event_id,
            content_type: default_content_type(),
            prompt: None,
            generated_content,
            metadata: empty_object(),
        }
    }
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
