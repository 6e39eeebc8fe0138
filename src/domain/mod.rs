//! Domain layer: event records, generated content and identifiers.
//!
//! These are the row shapes shared by every storage path. The relational
//! store, the REST backend and the on-device mirror all exchange
//! [`Event`] values in the same JSON form.

pub mod content;
pub mod event;
pub mod event_id;
pub mod user_id;

pub use content::{GeneratedContent, NewGeneratedContent};
pub use event::{Event, EventPatch, NewEvent};
pub use event_id::EventId;
pub use user_id::UserId;
