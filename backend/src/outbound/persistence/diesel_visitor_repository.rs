//! PostgreSQL-backed visitor adapter implementing the `VisitorCommand` and
//! `VisitorQuery` ports.
//!
//! Sightings upsert on `visitor_id`, so each browser install keeps one
//! evolving row. The stats block loads the aggregate columns and folds in
//! process; the unfiltered visitor set for one marketing site stays small
//! enough that a single pass beats juggling SQL aggregates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PersistenceError, VisitorCommand, VisitorQuery};
use crate::domain::visitor::{
    Device, DeviceCount, SourceCount, Visitor, VisitorFilter, VisitorId, VisitorSighting,
    VisitorStats,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewVisitorRow, VisitorRow, VisitorSightingUpdate};
use super::pool::DbPool;
use super::schema::visitors;

/// Traffic source label used when no UTM source was captured.
const DIRECT_SOURCE: &str = "direct";

/// How many traffic sources the stats block reports.
const TOP_SOURCES: usize = 5;

/// Diesel-backed implementation of the visitor ports.
#[derive(Clone)]
pub struct DieselVisitorRepository {
    pool: DbPool,
}

impl DieselVisitorRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escape SQL LIKE metacharacters in user-supplied search text.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Apply the admin filter to a boxed visitors query.
fn filtered(filter: &VisitorFilter) -> visitors::BoxedQuery<'static, Pg> {
    let mut query = visitors::table.into_boxed();
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            visitors::visitor_id
                .ilike(pattern.clone())
                .nullable()
                .or(visitors::email.ilike(pattern)),
        );
    }
    if let Some(converted) = filter.converted {
        query = query.filter(visitors::converted.eq(converted));
    }
    if let Some(device) = filter.device {
        query = query.filter(visitors::device.eq(device.to_string()));
    }
    query
}

/// Convert a database row to a domain visitor.
fn row_to_visitor(row: VisitorRow) -> Result<Visitor, PersistenceError> {
    let visitor_id = VisitorId::new(row.visitor_id)
        .map_err(|err| PersistenceError::query(format!("stored visitor id invalid: {err}")))?;
    Ok(Visitor {
        visitor_id,
        email: row.email,
        ip_address: row.ip_address,
        device: Device::classify(&row.device),
        utm_source: row.utm_source,
        time_on_site: row.time_on_site,
        converted: row.converted,
        created_at: row.created_at,
        last_seen: row.last_seen,
    })
}

fn rows_to_visitors(rows: Vec<VisitorRow>) -> Result<Vec<Visitor>, PersistenceError> {
    rows.into_iter().map(row_to_visitor).collect()
}

/// Columns loaded for the stats fold: time on site, converted, UTM source,
/// device, last seen.
type StatsRow = (i32, bool, Option<String>, String, DateTime<Utc>);

/// Fold the loaded stat columns into the admin stats block.
fn aggregate_stats(rows: &[StatsRow], now: DateTime<Utc>) -> VisitorStats {
    let total = rows.len() as i64;
    if total == 0 {
        return VisitorStats::default();
    }

    let day_ago = now - Duration::hours(24);
    let unique_last_24h = rows.iter().filter(|(.., last_seen)| *last_seen > day_ago).count() as i64;
    let converted = rows.iter().filter(|(_, converted, ..)| *converted).count() as i64;
    let time_total: i64 = rows.iter().map(|(time, ..)| i64::from(*time)).sum();

    let mut by_source = std::collections::BTreeMap::<&str, i64>::new();
    for (_, _, source, _, _) in rows {
        let label = source.as_deref().unwrap_or(DIRECT_SOURCE);
        *by_source.entry(label).or_default() += 1;
    }
    let mut top_sources: Vec<SourceCount> = by_source
        .into_iter()
        .map(|(source, count)| SourceCount {
            source: source.to_owned(),
            count,
        })
        .collect();
    // BTreeMap iteration gives a stable name order for equal counts.
    top_sources.sort_by(|a, b| b.count.cmp(&a.count));
    top_sources.truncate(TOP_SOURCES);

    let mut by_device = std::collections::BTreeMap::<String, (Device, i64)>::new();
    for (_, _, _, device, _) in rows {
        let classified = Device::classify(device);
        let entry = by_device
            .entry(classified.to_string())
            .or_insert((classified, 0));
        entry.1 += 1;
    }
    let device_breakdown = by_device
        .into_values()
        .map(|(device, count)| DeviceCount { device, count })
        .collect();

    #[expect(
        clippy::cast_precision_loss,
        reason = "visitor counts stay far below f64's integer range"
    )]
    let (avg_time_on_site, conversion_rate) = (
        time_total as f64 / total as f64,
        converted as f64 * 100.0 / total as f64,
    );

    VisitorStats {
        total_visitors: total,
        unique_last_24h,
        avg_time_on_site,
        conversion_rate,
        top_sources,
        device_breakdown,
    }
}

#[async_trait]
impl VisitorCommand for DieselVisitorRepository {
    async fn record(
        &self,
        sighting: VisitorSighting,
        seen_at: DateTime<Utc>,
    ) -> Result<Visitor, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let device = sighting.device.to_string();
        let new_row = NewVisitorRow {
            visitor_id: sighting.visitor_id.as_ref(),
            email: sighting.email.as_deref(),
            ip_address: &sighting.ip_address,
            device: &device,
            utm_source: sighting.utm_source.as_deref(),
            time_on_site: 0,
            converted: false,
            created_at: seen_at,
            last_seen: seen_at,
        };
        let update = VisitorSightingUpdate {
            email: sighting.email.as_deref(),
            ip_address: &sighting.ip_address,
            device: &device,
            utm_source: sighting.utm_source.as_deref(),
            last_seen: seen_at,
        };

        let row: VisitorRow = diesel::insert_into(visitors::table)
            .values(&new_row)
            .on_conflict(visitors::visitor_id)
            .do_update()
            .set(&update)
            .returning(VisitorRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_visitor(row)
    }

    async fn erase(&self, visitor_id: &VisitorId) -> Result<u64, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let removed =
            diesel::delete(visitors::table.filter(visitors::visitor_id.eq(visitor_id.as_ref())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl VisitorQuery for DieselVisitorRepository {
    async fn count(&self) -> Result<i64, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        visitors::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn list(
        &self,
        filter: VisitorFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Visitor>, i64), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<VisitorRow> = filtered(&filter)
            .order(visitors::last_seen.desc())
            .offset(offset)
            .limit(limit)
            .select(VisitorRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let total: i64 = filtered(&filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok((rows_to_visitors(rows)?, total))
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<VisitorStats, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StatsRow> = visitors::table
            .select((
                visitors::time_on_site,
                visitors::converted,
                visitors::utm_source,
                visitors::device,
                visitors::last_seen,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(aggregate_stats(&rows, now))
    }

    async fn export(&self, filter: VisitorFilter) -> Result<Vec<Visitor>, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<VisitorRow> = filtered(&filter)
            .order(visitors::last_seen.desc())
            .select(VisitorRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_to_visitors(rows)
    }
}
