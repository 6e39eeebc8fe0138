//! Shared DTO types used across endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success envelope wrapping every response payload.
///
/// ```json
/// { "data": [ { "id": "…", "event_name": "Launch" } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataEnvelope<T> {
    /// The payload.
    pub data: T,
}

impl<T> DataEnvelope<T> {
    /// Wraps a payload.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}
