//! # event-planner
//!
//! Data-access layer for an event planning application, plus the REST
//! backend it talks to.
//!
//! Every call through [`service::EventService`] probes the REST backend,
//! resolves the current identity, and then routes to one of three
//! providers. Reads that fail remotely are served from an on-device
//! mirror; writes that fail remotely reach the caller.
//!
//! ## Architecture
//!
//! ```text
//! Client code
//!     │
//!     ├── EventService (service/)
//!     │     ├── liveness probe + IdentityResolver (identity)
//!     │     └── FailurePolicy per operation
//!     │
//!     ├── RestProvider ──────► REST backend (api/, bin)
//!     │                            └── DatabaseProvider
//!     ├── DatabaseProvider (provider/)
//!     │     └── PostgresStore (persistence/) ──► PostgreSQL + RLS
//!     │
//!     └── EventMirror (provider/)
//!           └── DeviceStorage (storage/): session + persistent scopes
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod persistence;
pub mod provider;
pub mod service;
pub mod storage;
