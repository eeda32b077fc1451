//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's storage ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! The adapters stay thin: they translate between the internal Diesel row
//! structs (`models.rs`, `schema.rs`) and domain types, and map driver
//! failures into [`crate::domain::ports::PersistenceError`]. No business
//! logic lives here.

mod diesel_analytics_query;
mod diesel_event_sink;
mod diesel_payment_repository;
mod diesel_settings_repository;
mod diesel_trial_repository;
mod diesel_visitor_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_analytics_query::DieselAnalyticsQuery;
pub use diesel_event_sink::DieselEventSink;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_settings_repository::DieselSettingsRepository;
pub use diesel_trial_repository::DieselTrialRepository;
pub use diesel_visitor_repository::DieselVisitorRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolError};
