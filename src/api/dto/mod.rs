//! Data Transfer Objects for REST request/response serialization.
//!
//! Event records and inputs travel as the domain types themselves; this
//! module only adds the response envelope.

pub mod common_dto;

pub use common_dto::*;
