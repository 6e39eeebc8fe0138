//! Service layer: client-side orchestration.
//!
//! [`EventService`] selects a storage provider per call, applies the
//! per-operation [`FailurePolicy`], and keeps the on-device mirror in sync.

pub mod event_service;
pub mod policy;

pub use event_service::EventService;
pub use policy::{FailurePolicy, OperationKind};
