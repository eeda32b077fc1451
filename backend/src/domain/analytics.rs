//! Read-only analytics aggregation for the admin dashboard.
//!
//! Seven independent metrics are fetched concurrently over a trailing time
//! window. Each metric is fault-isolated: a failed query logs a warning and
//! substitutes its zero-value default, so one bad query never empties the
//! whole dashboard.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::{AnalyticsQuery, PersistenceError};

/// Maximum trailing window, in days.
pub const MAX_WINDOW_DAYS: i64 = 365;
/// Default trailing window, in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
/// Maximum top-N breakdown size.
pub const MAX_TOP_N: i64 = 50;
/// Default top-N breakdown size.
pub const DEFAULT_TOP_N: i64 = 10;

/// Validated aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsWindow {
    days: i64,
    top_n: i64,
}

impl AnalyticsWindow {
    /// Validate window parameters, applying documented defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] with field details when `days` or
    /// `topN` falls outside its accepted range.
    pub fn try_new(days: Option<i64>, top_n: Option<i64>) -> Result<Self, Error> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(
                Error::invalid_request(format!("days must be between 1 and {MAX_WINDOW_DAYS}"))
                    .with_details(json!({ "field": "days", "value": days })),
            );
        }
        let top_n = top_n.unwrap_or(DEFAULT_TOP_N);
        if !(1..=MAX_TOP_N).contains(&top_n) {
            return Err(
                Error::invalid_request(format!("topN must be between 1 and {MAX_TOP_N}"))
                    .with_details(json!({ "field": "topN", "value": top_n })),
            );
        }
        Ok(Self { days, top_n })
    }

    pub fn days(self) -> i64 {
        self.days
    }

    pub fn top_n(self) -> i64 {
        self.top_n
    }

    /// Inclusive lower bound of the window relative to `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }
}

/// Platform-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTotals {
    pub users: i64,
    pub active_subscriptions: i64,
    pub total_generations: i64,
    /// Lifetime paid revenue, in minor currency units.
    pub total_revenue_minor: i64,
    /// Generations inside the requested window.
    pub recent_generations: i64,
    /// Signups inside the requested window.
    pub recent_signups: i64,
}

/// One ranked item in a popularity breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub name: String,
    pub count: i64,
}

/// Daily generation count inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: i64,
}

/// Daily paid revenue inside the window, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub total_minor: i64,
}

/// Subscriber count per plan tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanCount {
    pub plan: String,
    pub count: i64,
}

/// The aggregate bundle returned to the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsBundle {
    /// Human-readable window label, e.g. `"Last 30 days"`.
    pub period: String,
    pub totals: PlatformTotals,
    pub popular_styles: Vec<RankedItem>,
    pub popular_backgrounds: Vec<RankedItem>,
    pub popular_accessories: Vec<RankedItem>,
    pub generation_trend: Vec<TrendPoint>,
    pub revenue_trend: Vec<RevenuePoint>,
    pub plan_distribution: Vec<PlanCount>,
    /// Cold-start hint for operators; present only when the platform has
    /// zero users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Aggregation use-case over the [`AnalyticsQuery`] port.
#[derive(Clone)]
pub struct AnalyticsService {
    query: Arc<dyn AnalyticsQuery>,
}

/// Await a metric, substituting its default on failure.
async fn metric_or_default<T, F>(metric: &'static str, fut: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, PersistenceError>>,
{
    match fut.await {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, metric, "analytics metric failed; substituting default");
            T::default()
        }
    }
}

impl AnalyticsService {
    pub fn new(query: Arc<dyn AnalyticsQuery>) -> Self {
        Self { query }
    }

    /// Compute the full aggregate bundle for the window ending at `now`.
    ///
    /// All seven metrics run concurrently; none shares state with another,
    /// and a failure in any one leaves the other six intact.
    pub async fn summarise(&self, window: AnalyticsWindow, now: DateTime<Utc>) -> AnalyticsBundle {
        let since = window.since(now);
        let top_n = window.top_n();
        let q = &self.query;

        let (
            totals,
            popular_styles,
            popular_backgrounds,
            popular_accessories,
            generation_trend,
            revenue_trend,
            plan_distribution,
        ) = tokio::join!(
            metric_or_default("platform_totals", q.platform_totals(since)),
            metric_or_default("popular_styles", q.popular_styles(since, top_n)),
            metric_or_default("popular_backgrounds", q.popular_backgrounds(since, top_n)),
            metric_or_default("popular_accessories", q.popular_accessories(since, top_n)),
            metric_or_default("generation_trend", q.generation_trend(since)),
            metric_or_default("revenue_trend", q.revenue_trend(since)),
            metric_or_default("plan_distribution", q.plan_distribution()),
        );

        let hint = (totals.users == 0)
            .then(|| "No users yet. Metrics will populate after the first signup.".to_owned());

        AnalyticsBundle {
            period: format!("Last {} days", window.days()),
            totals,
            popular_styles,
            popular_backgrounds,
            popular_accessories,
            generation_trend,
            revenue_trend,
            plan_distribution,
            hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockAnalyticsQuery;
    use rstest::rstest;

    fn populated_query() -> MockAnalyticsQuery {
        let mut query = MockAnalyticsQuery::new();
        query.expect_platform_totals().returning(|_| {
            Ok(PlatformTotals {
                users: 12,
                active_subscriptions: 3,
                total_generations: 240,
                total_revenue_minor: 99_800,
                recent_generations: 40,
                recent_signups: 5,
            })
        });
        query.expect_popular_styles().returning(|_, _| {
            Ok(vec![RankedItem {
                name: "royal".to_owned(),
                count: 120,
            }])
        });
        query.expect_popular_backgrounds().returning(|_, _| Ok(vec![]));
        query.expect_popular_accessories().returning(|_, _| Ok(vec![]));
        query.expect_generation_trend().returning(|_| Ok(vec![]));
        query.expect_revenue_trend().returning(|_| Ok(vec![]));
        query.expect_plan_distribution().returning(|| {
            Ok(vec![PlanCount {
                plan: "portrait_pack".to_owned(),
                count: 3,
            }])
        });
        query
    }

    #[rstest]
    #[case(None, None, Ok((DEFAULT_WINDOW_DAYS, DEFAULT_TOP_N)))]
    #[case(Some(7), Some(5), Ok((7, 5)))]
    #[case(Some(0), None, Err(()))]
    #[case(Some(366), None, Err(()))]
    #[case(None, Some(0), Err(()))]
    #[case(None, Some(51), Err(()))]
    fn window_validation(
        #[case] days: Option<i64>,
        #[case] top_n: Option<i64>,
        #[case] expected: Result<(i64, i64), ()>,
    ) {
        let result = AnalyticsWindow::try_new(days, top_n)
            .map(|w| (w.days(), w.top_n()))
            .map_err(|err| {
                assert_eq!(err.code(), ErrorCode::InvalidRequest);
            });
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn bundles_all_metrics_with_period_label() {
        let service = AnalyticsService::new(Arc::new(populated_query()));
        let window = AnalyticsWindow::try_new(Some(7), None).expect("valid window");

        let bundle = service.summarise(window, Utc::now()).await;
        assert_eq!(bundle.period, "Last 7 days");
        assert_eq!(bundle.totals.users, 12);
        assert_eq!(bundle.popular_styles.len(), 1);
        assert!(bundle.hint.is_none());
    }

    #[tokio::test]
    async fn one_failed_metric_defaults_without_failing_the_rest() {
        let mut query = populated_query();
        // Re-register the styles expectation to fail from now on.
        query.checkpoint();
        query.expect_platform_totals().returning(|_| {
            Ok(PlatformTotals {
                users: 12,
                ..PlatformTotals::default()
            })
        });
        query
            .expect_popular_styles()
            .returning(|_, _| Err(PersistenceError::query("relation missing")));
        query.expect_popular_backgrounds().returning(|_, _| {
            Ok(vec![RankedItem {
                name: "forest".to_owned(),
                count: 9,
            }])
        });
        query.expect_popular_accessories().returning(|_, _| Ok(vec![]));
        query.expect_generation_trend().returning(|_| Ok(vec![]));
        query.expect_revenue_trend().returning(|_| Ok(vec![]));
        query.expect_plan_distribution().returning(|| Ok(vec![]));

        let service = AnalyticsService::new(Arc::new(query));
        let window = AnalyticsWindow::try_new(None, None).expect("valid window");

        let bundle = service.summarise(window, Utc::now()).await;
        assert!(bundle.popular_styles.is_empty());
        assert_eq!(bundle.popular_backgrounds.len(), 1);
        assert_eq!(bundle.totals.users, 12);
    }

    #[tokio::test]
    async fn zero_users_sets_cold_start_hint() {
        let mut query = MockAnalyticsQuery::new();
        query
            .expect_platform_totals()
            .returning(|_| Ok(PlatformTotals::default()));
        query.expect_popular_styles().returning(|_, _| Ok(vec![]));
        query.expect_popular_backgrounds().returning(|_, _| Ok(vec![]));
        query.expect_popular_accessories().returning(|_, _| Ok(vec![]));
        query.expect_generation_trend().returning(|_| Ok(vec![]));
        query.expect_revenue_trend().returning(|_| Ok(vec![]));
        query.expect_plan_distribution().returning(|| Ok(vec![]));

        let service = AnalyticsService::new(Arc::new(query));
        let window = AnalyticsWindow::try_new(None, None).expect("valid window");

        let bundle = service.summarise(window, Utc::now()).await;
        assert!(bundle.hint.is_some());
    }
}
