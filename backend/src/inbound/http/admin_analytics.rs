//! Admin analytics endpoint.
//!
//! ```text
//! GET /api/v1/admin/analytics?days=N&topN=M
//! ```
//!
//! Returns the aggregate dashboard bundle. The service layer fans out the
//! underlying queries concurrently and substitutes defaults for individual
//! failures, so this handler always answers 200 once the window validates.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::analytics::{AnalyticsBundle, AnalyticsWindow};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminSession;
use crate::inbound::http::state::HttpState;

/// Query parameters for the analytics bundle.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    /// Trailing window in days. Defaults to 30, maximum 365.
    pub days: Option<i64>,
    /// Breakdown size for the popularity rankings. Defaults to 10.
    pub top_n: Option<i64>,
}

/// Compute the admin analytics bundle.
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics",
    params(AnalyticsParams),
    responses(
        (status = 200, description = "Aggregate bundle", body = AnalyticsBundle),
        (status = 400, description = "Invalid window", body = crate::domain::Error),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[get("/admin/analytics")]
pub async fn admin_analytics(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    params: web::Query<AnalyticsParams>,
) -> ApiResult<HttpResponse> {
    let window = AnalyticsWindow::try_new(params.days, params.top_n)?;
    let bundle = state.analytics.summarise(window, Utc::now()).await;
    Ok(HttpResponse::Ok().json(bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analytics::{PlatformTotals, RankedItem};
    use crate::domain::ports::{MockAnalyticsQuery, PersistenceError};
    use crate::inbound::http::test_utils::{TEST_ADMIN_KEY, TestPorts};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    async fn app_with(
        ports: TestPorts,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.into_state()))
                .service(web::scope("/api/v1").service(admin_analytics)),
        )
        .await
    }

    fn healthy_query() -> MockAnalyticsQuery {
        let mut query = MockAnalyticsQuery::new();
        query.expect_platform_totals().returning(|_| {
            Ok(PlatformTotals {
                users: 3,
                active_subscriptions: 1,
                total_generations: 40,
                total_revenue_minor: 59_800,
                recent_generations: 12,
                recent_signups: 2,
            })
        });
        query.expect_popular_styles().returning(|_, _| {
            Ok(vec![RankedItem {
                name: "royal".to_owned(),
                count: 25,
            }])
        });
        query.expect_popular_backgrounds().returning(|_, _| Ok(vec![]));
        query.expect_popular_accessories().returning(|_, _| Ok(vec![]));
        query.expect_generation_trend().returning(|_| Ok(vec![]));
        query.expect_revenue_trend().returning(|_| Ok(vec![]));
        query.expect_plan_distribution().returning(|| Ok(vec![]));
        query
    }

    #[actix_web::test]
    async fn rejects_missing_bearer_without_touching_ports() {
        // TestPorts' untouched mocks panic on any call, so a 401 response
        // here proves zero storage reads happened.
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/analytics")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn rejects_mismatched_bearer() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/analytics")
            .insert_header(("Authorization", "Bearer wrong-key"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn returns_the_full_bundle() {
        let mut ports = TestPorts::default();
        ports.analytics = healthy_query();
        let app = app_with(ports).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/analytics?days=7")
            .insert_header(("Authorization", format!("Bearer {TEST_ADMIN_KEY}")))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["period"], "Last 7 days");
        assert_eq!(body["totals"]["users"], 3);
        assert_eq!(body["popularStyles"][0]["name"], "royal");
    }

    #[actix_web::test]
    async fn one_failing_metric_still_answers_200() {
        let mut query = healthy_query();
        query.checkpoint();
        query
            .expect_platform_totals()
            .returning(|_| Err(PersistenceError::query("totals broke")));
        query.expect_popular_styles().returning(|_, _| {
            Ok(vec![RankedItem {
                name: "royal".to_owned(),
                count: 25,
            }])
        });
        query.expect_popular_backgrounds().returning(|_, _| Ok(vec![]));
        query.expect_popular_accessories().returning(|_, _| Ok(vec![]));
        query.expect_generation_trend().returning(|_| Ok(vec![]));
        query.expect_revenue_trend().returning(|_| Ok(vec![]));
        query.expect_plan_distribution().returning(|| Ok(vec![]));
        let mut ports = TestPorts::default();
        ports.analytics = query;
        let app = app_with(ports).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/analytics")
            .insert_header(("Authorization", format!("Bearer {TEST_ADMIN_KEY}")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["totals"]["users"], 0);
        assert_eq!(body["popularStyles"][0]["count"], 25);
    }

    #[actix_web::test]
    async fn out_of_range_window_is_rejected() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/admin/analytics?days=400")
            .insert_header(("Authorization", format!("Bearer {TEST_ADMIN_KEY}")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
