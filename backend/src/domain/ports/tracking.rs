//! Ports for visitor and event ingestion plus the admin visitor queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::domain::events::{EventId, NewEvent};
use crate::domain::ports::PersistenceError;
use crate::domain::visitor::{Visitor, VisitorFilter, VisitorId, VisitorSighting, VisitorStats};

/// Mutating port for visitor records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VisitorCommand: Send + Sync {
    /// Upsert the visitor keyed by `visitor_id`, refreshing contact and
    /// device details and setting `last_seen` to the supplied time.
    async fn record(
        &self,
        sighting: VisitorSighting,
        seen_at: DateTime<Utc>,
    ) -> Result<Visitor, PersistenceError>;

    /// Hard-delete every row for the identifier. Returns the number of rows
    /// removed. Used for consent withdrawal and right-to-erasure requests.
    async fn erase(&self, visitor_id: &VisitorId) -> Result<u64, PersistenceError>;
}

/// Read-only port over visitor records for the admin surface.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VisitorQuery: Send + Sync {
    /// Total number of visitor records.
    async fn count(&self) -> Result<i64, PersistenceError>;

    /// One page of visitors matching the filter, plus the filtered total.
    async fn list(
        &self,
        filter: VisitorFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Visitor>, i64), PersistenceError>;

    /// Stats computed over the full, unfiltered visitor set.
    async fn stats(&self, now: DateTime<Utc>) -> Result<VisitorStats, PersistenceError>;

    /// All visitors matching the filter, unpaginated, for CSV export.
    async fn export(&self, filter: VisitorFilter) -> Result<Vec<Visitor>, PersistenceError>;
}

/// Append-only sink for user events.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Insert one immutable event row and return its identifier.
    async fn append(&self, event: NewEvent) -> Result<EventId, PersistenceError>;
}
