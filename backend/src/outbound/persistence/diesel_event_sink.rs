//! PostgreSQL-backed `EventSink` implementation.
//!
//! Events are append-only: this adapter only ever inserts, and nothing in
//! the crate exposes an update path for the table.

use async_trait::async_trait;
use chrono::Utc;
use diesel_async::RunQueryDsl;

use crate::domain::events::{EventId, NewEvent};
use crate::domain::ports::{EventSink, PersistenceError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewEventRow;
use super::pool::DbPool;
use super::schema::user_events;

/// Diesel-backed implementation of the `EventSink` port.
#[derive(Clone)]
pub struct DieselEventSink {
    pool: DbPool,
}

impl DieselEventSink {
    /// Create a new sink with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventSink for DieselEventSink {
    async fn append(&self, event: NewEvent) -> Result<EventId, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewEventRow {
            event_type: &event.event_type,
            user_id: event.user_id,
            email: event.email.as_deref(),
            ip_address: &event.ip_address,
            metadata: &event.metadata,
            created_at: Utc::now(),
        };

        diesel::insert_into(user_events::table)
            .values(&row)
            .returning(user_events::id)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
