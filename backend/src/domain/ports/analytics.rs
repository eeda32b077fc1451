//! Read-only port behind the admin analytics aggregator.
//!
//! Each method is one isolated query; the service layer fans them out
//! concurrently and substitutes defaults on individual failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::domain::analytics::{PlanCount, PlatformTotals, RankedItem, RevenuePoint, TrendPoint};
use crate::domain::ports::PersistenceError;

/// Aggregate queries over users, generations, and payments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnalyticsQuery: Send + Sync {
    /// Platform counters; window-bound fields use `since`.
    async fn platform_totals(&self, since: DateTime<Utc>)
    -> Result<PlatformTotals, PersistenceError>;

    /// Top styles by generation count inside the window.
    async fn popular_styles(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError>;

    /// Top backgrounds by generation count inside the window.
    async fn popular_backgrounds(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError>;

    /// Top accessories by generation count inside the window.
    async fn popular_accessories(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError>;

    /// Generations per day inside the window, oldest first.
    async fn generation_trend(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, PersistenceError>;

    /// Paid revenue per day inside the window, oldest first.
    async fn revenue_trend(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RevenuePoint>, PersistenceError>;

    /// Subscriber count per plan tier, full history.
    async fn plan_distribution(&self) -> Result<Vec<PlanCount>, PersistenceError>;
}
