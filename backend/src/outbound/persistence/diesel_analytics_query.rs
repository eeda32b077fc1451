//! PostgreSQL-backed `AnalyticsQuery` implementation.
//!
//! Counts and groupings run in SQL; ranking order and the daily trend
//! buckets are folded in process where the row volumes are small. Each
//! method stands alone so the service layer can fan them out concurrently
//! and fault-isolate individual failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::analytics::{PlanCount, PlatformTotals, RankedItem, RevenuePoint, TrendPoint};
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{AnalyticsQuery, PersistenceError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::{generations, payments, users};

/// Diesel-backed implementation of the `AnalyticsQuery` port.
#[derive(Clone)]
pub struct DieselAnalyticsQuery {
    pool: DbPool,
}

impl DieselAnalyticsQuery {
    /// Create a new query adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Order grouped counts largest first and keep the top `limit`.
fn rank(rows: Vec<(String, i64)>, limit: i64) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = rows
        .into_iter()
        .map(|(name, count)| RankedItem { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    ranked
}

/// Bucket timestamps into per-day counts, oldest day first.
fn bucket_daily(timestamps: &[DateTime<Utc>]) -> Vec<TrendPoint> {
    let mut by_day = std::collections::BTreeMap::new();
    for stamp in timestamps {
        *by_day.entry(stamp.date_naive()).or_insert(0i64) += 1;
    }
    by_day
        .into_iter()
        .map(|(date, count)| TrendPoint { date, count })
        .collect()
}

/// Bucket paid amounts into per-day totals, oldest day first.
fn bucket_revenue(entries: &[(DateTime<Utc>, i64)]) -> Vec<RevenuePoint> {
    let mut by_day = std::collections::BTreeMap::new();
    for (stamp, amount) in entries {
        *by_day.entry(stamp.date_naive()).or_insert(0i64) += amount;
    }
    by_day
        .into_iter()
        .map(|(date, total_minor)| RevenuePoint { date, total_minor })
        .collect()
}

#[async_trait]
impl AnalyticsQuery for DieselAnalyticsQuery {
    async fn platform_totals(
        &self,
        since: DateTime<Utc>,
    ) -> Result<PlatformTotals, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let active_subscriptions: i64 = users::table
            .filter(users::subscription_active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let total_generations: i64 = generations::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let paid_amounts: Vec<i64> = payments::table
            .filter(payments::status.eq(PaymentStatus::Paid.to_string()))
            .select(payments::amount_minor)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let recent_generations: i64 = generations::table
            .filter(generations::created_at.ge(since))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let recent_signups: i64 = users::table
            .filter(users::created_at.ge(since))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(PlatformTotals {
            users: user_count,
            active_subscriptions,
            total_generations,
            total_revenue_minor: paid_amounts.iter().sum(),
            recent_generations,
            recent_signups,
        })
    }

    async fn popular_styles(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(String, i64)> = generations::table
            .filter(generations::created_at.ge(since))
            .group_by(generations::style)
            .select((generations::style, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rank(rows, limit))
    }

    async fn popular_backgrounds(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<String>, i64)> = generations::table
            .filter(generations::created_at.ge(since))
            .filter(generations::background.is_not_null())
            .group_by(generations::background)
            .select((generations::background, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let named = rows
            .into_iter()
            .filter_map(|(name, count)| name.map(|name| (name, count)))
            .collect();
        Ok(rank(named, limit))
    }

    async fn popular_accessories(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RankedItem>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<String>, i64)> = generations::table
            .filter(generations::created_at.ge(since))
            .filter(generations::accessory.is_not_null())
            .group_by(generations::accessory)
            .select((generations::accessory, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let named = rows
            .into_iter()
            .filter_map(|(name, count)| name.map(|name| (name, count)))
            .collect();
        Ok(rank(named, limit))
    }

    async fn generation_trend(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stamps: Vec<DateTime<Utc>> = generations::table
            .filter(generations::created_at.ge(since))
            .select(generations::created_at)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(bucket_daily(&stamps))
    }

    async fn revenue_trend(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RevenuePoint>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(Option<DateTime<Utc>>, i64)> = payments::table
            .filter(payments::status.eq(PaymentStatus::Paid.to_string()))
            .filter(payments::paid_at.ge(Some(since)))
            .select((payments::paid_at, payments::amount_minor))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let entries: Vec<(DateTime<Utc>, i64)> = rows
            .into_iter()
            .filter_map(|(paid_at, amount)| paid_at.map(|stamp| (stamp, amount)))
            .collect();
        Ok(bucket_revenue(&entries))
    }

    async fn plan_distribution(&self) -> Result<Vec<PlanCount>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(String, i64)> = users::table
            .group_by(users::plan)
            .select((users::plan, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let mut distribution: Vec<PlanCount> = rows
            .into_iter()
            .map(|(plan, count)| PlanCount { plan, count })
            .collect();
        distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.plan.cmp(&b.plan)));
        Ok(distribution)
    }
}
