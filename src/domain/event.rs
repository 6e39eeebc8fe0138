//! Event records and their creation / partial-update inputs.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventId, UserId};
use crate::error::PlannerError;

/// A planned event, in the row shape shared by the relational store, the
/// REST backend and the on-device mirror.
///
/// `user_id` never changes after creation. `updated_at` strictly
/// increases on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub event_name: String,
    /// Category tag (e.g. `"conference"`).
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
    /// Duration descriptor (e.g. `"2 hours"`).
    pub duration: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Stamps a new modification time, strictly later than the current one
    /// even when the clock has not advanced.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

/// Input for creating an event. Field names are camelCase, matching the
/// planner's form payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct NewEvent {
    /// Display name. Must not be blank.
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
    /// Expected attendee count. Must not be negative.
    pub audience_size: Option<i32>,
    /// Duration descriptor.
    pub duration: Option<String>,
}

impl NewEvent {
    /// Shorthand for an event with only a name.
    #[must_use]
    pub fn named(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    /// Checks the input before any I/O happens.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidRequest`] if the name is blank or
    /// the audience size is negative.
    pub fn validate(&self) -> Result<(), PlannerError> {
        validate_name(&self.event_name)?;
        validate_audience(self.audience_size)
    }

    /// Materializes a full record owned by `owner`, as the mirror does for
    /// events created without a remote store.
    #[must_use]
    pub fn into_event(self, id: EventId, owner: UserId, now: DateTime<Utc>) -> Event {
        Event {
            id,
            user_id: owner,
            event_name: self.event_name,
            event_type: self.event_type,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            city: self.city,
            venue_type: self.venue_type,
            audience_size: self.audience_size,
            duration: self.duration,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of an [`Event`]. Absent fields are left untouched;
/// identity, owner and timestamps are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct EventPatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// New category tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New calendar date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// New time of day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    /// New location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// New venue category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_type: Option<String>,
    /// New attendee count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_size: Option<i32>,
    /// New duration descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl EventPatch {
    /// Checks the patched fields.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidRequest`] if a new name is blank or a
    /// new audience size is negative.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if let Some(name) = &self.event_name {
            validate_name(name)?;
        }
        validate_audience(self.audience_size)
    }

    /// Overwrites every field present in the patch. Does not touch
    /// `updated_at`; callers stamp it with [`Event::touch`].
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(v) = &self.event_name {
            event.event_name.clone_from(v);
        }
        if let Some(v) = &self.event_type {
            event.event_type = Some(v.clone());
        }
        if let Some(v) = &self.description {
            event.description = Some(v.clone());
        }
        if let Some(v) = self.date {
            event.date = Some(v);
        }
        if let Some(v) = self.time {
            event.time = Some(v);
        }
        if let Some(v) = &self.location {
            event.location = Some(v.clone());
        }
        if let Some(v) = &self.city {
            event.city = Some(v.clone());
        }
        if let Some(v) = &self.venue_type {
            event.venue_type = Some(v.clone());
        }
        if let Some(v) = self.audience_size {
            event.audience_size = Some(v);
        }
        if let Some(v) = &self.duration {
            event.duration = Some(v.clone());
        }
    }
}

fn validate_name(name: &str) -> Result<(), PlannerError> {
    if name.trim().is_empty() {
        return Err(PlannerError::InvalidRequest(
            "event name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_audience(size: Option<i32>) -> Result<(), PlannerError> {
    match size {
        Some(n) if n < 0 => Err(PlannerError::InvalidRequest(format!(
            "audience size must not be negative, got {n}"
        ))),
        _ => Ok(()),
    }
}
