//! Persistence layer: PostgreSQL events and generated content.
//!
//! The schema, row-level security policies and `updated_at` triggers live
//! in `migrations/`. [`postgres::PostgresStore`] issues the queries through
//! `sqlx::PgPool`.

pub mod models;
pub mod postgres;

pub use postgres::PostgresStore;
