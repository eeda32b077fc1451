//! Public tracking endpoints: status, visitor ingestion, event ingestion.
//!
//! ```text
//! GET    /api/v1/tracking-status   Remote kill-switch probe
//! POST   /api/v1/track-visitor     Record a visitor sighting
//! DELETE /api/v1/track-visitor     Right-to-erasure delete
//! POST   /api/v1/analytics/track   Append one custom event
//! ```
//!
//! Telemetry writes never fail the caller's primary flow: persistence
//! failures on the ingestion paths respond HTTP 200 with a soft-failure
//! envelope. Validation failures are still 400.

use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::domain::events::{EventId, NewEvent};
use crate::domain::settings::{TRACKING_ENABLED_KEY, tracking_enabled};
use crate::domain::visitor::{Device, VisitorId, VisitorSighting};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field_error, missing_field_error};

/// Client IP derived from proxy headers, falling back to the socket peer
/// and then `"unknown"`.
pub(crate) fn client_ip(req: &HttpRequest) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Kill-switch probe response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TrackingStatusBody {
    /// `"online"` when tracking may proceed, `"offline"` otherwise.
    pub status: &'static str,
    /// Total visitor count, present only when online.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitors: Option<i64>,
}

impl TrackingStatusBody {
    fn online(visitors: Option<i64>) -> Self {
        Self {
            status: "online",
            visitors,
        }
    }

    fn offline() -> Self {
        Self {
            status: "offline",
            visitors: None,
        }
    }
}

/// Probe the tracking kill-switch.
///
/// Clients call this before activating any tracking, including the consent
/// prompt. The endpoint fails closed: when the settings store cannot be
/// reached it reports `offline` rather than erroring, because an
/// unconfirmed switch must read as "do not track".
#[utoipa::path(
    get,
    path = "/api/v1/tracking-status",
    responses((status = 200, description = "Tracking switch state", body = TrackingStatusBody)),
    tags = ["tracking"]
)]
#[get("/tracking-status")]
pub async fn tracking_status(state: web::Data<HttpState>) -> HttpResponse {
    let setting = match state.settings.get(TRACKING_ENABLED_KEY).await {
        Ok(setting) => setting,
        Err(error) => {
            warn!(%error, "tracking status probe failed; reporting offline");
            return HttpResponse::Ok().json(TrackingStatusBody::offline());
        }
    };

    if !tracking_enabled(setting.as_ref()) {
        return HttpResponse::Ok().json(TrackingStatusBody::offline());
    }

    let visitors = match state.visitor_query.count().await {
        Ok(count) => Some(count),
        Err(error) => {
            warn!(%error, "visitor count unavailable for status probe");
            None
        }
    };
    HttpResponse::Ok().json(TrackingStatusBody::online(visitors))
}

/// Visitor sighting payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitorRequest {
    pub visitor_id: Option<String>,
    pub email: Option<String>,
    /// Client-reported address; the server falls back to proxy headers.
    pub ip_address: Option<String>,
    pub device: Option<String>,
    pub utm_source: Option<String>,
}

/// Soft-success envelope for telemetry writes.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TrackAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TrackAck {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn soft_fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

fn required_trimmed(value: Option<&str>, field: &str) -> ApiResult<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| missing_field_error(field))
}

/// Record a visitor sighting, upserting on the visitor identifier.
#[utoipa::path(
    post,
    path = "/api/v1/track-visitor",
    request_body = TrackVisitorRequest,
    responses(
        (status = 200, description = "Recorded, or soft failure", body = TrackAck),
        (status = 400, description = "Missing required field", body = crate::domain::Error)
    ),
    tags = ["tracking"]
)]
#[post("/track-visitor")]
pub async fn record_visitor(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<TrackVisitorRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let raw_id = required_trimmed(body.visitor_id.as_deref(), "visitorId")?;
    let visitor_id = VisitorId::new(raw_id.as_str())
        .map_err(|err| invalid_field_error("visitorId", err.to_string(), &raw_id))?;
    let device_raw = required_trimmed(body.device.as_deref(), "device")?;
    let device = Device::classify(&device_raw);
    let ip_address = body
        .ip_address
        .filter(|ip| !ip.trim().is_empty())
        .unwrap_or_else(|| client_ip(&req));

    let sighting = VisitorSighting {
        visitor_id,
        email: body.email.filter(|e| !e.trim().is_empty()),
        ip_address,
        device,
        utm_source: body.utm_source.filter(|s| !s.trim().is_empty()),
    };

    match state.visitors.record(sighting, Utc::now()).await {
        Ok(_) => Ok(HttpResponse::Ok().json(TrackAck::ok())),
        Err(error) => {
            warn!(%error, "visitor write failed; degrading to soft failure");
            Ok(HttpResponse::Ok().json(TrackAck::soft_fail("visitor tracking temporarily unavailable")))
        }
    }
}

/// Right-to-erasure payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EraseVisitorRequest {
    pub visitor_id: Option<String>,
}

/// Hard-delete every record for a visitor identifier.
///
/// Erasure is a compliance action, not telemetry: persistence failures
/// surface as hard errors so the caller knows the data is still present.
#[utoipa::path(
    delete,
    path = "/api/v1/track-visitor",
    request_body = EraseVisitorRequest,
    responses(
        (status = 200, description = "All rows removed", body = TrackAck),
        (status = 400, description = "Missing visitor id", body = crate::domain::Error),
        (status = 503, description = "Store unreachable", body = crate::domain::Error)
    ),
    tags = ["tracking"]
)]
#[delete("/track-visitor")]
pub async fn erase_visitor(
    state: web::Data<HttpState>,
    payload: web::Json<EraseVisitorRequest>,
) -> ApiResult<HttpResponse> {
    let raw_id = required_trimmed(payload.visitor_id.as_deref(), "visitorId")?;
    let visitor_id = VisitorId::new(raw_id.as_str())
        .map_err(|err| invalid_field_error("visitorId", err.to_string(), &raw_id))?;

    let removed = state.visitors.erase(&visitor_id).await?;
    tracing::info!(visitor_id = %visitor_id, removed, "visitor erased");
    Ok(HttpResponse::Ok().json(TrackAck::ok()))
}

/// Event ingestion acknowledgement.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn optional_user_id(object: &serde_json::Map<String, Value>) -> ApiResult<Option<Uuid>> {
    match object.get("userId") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| invalid_field_error("userId", "userId must be a UUID", raw)),
        Some(other) => Err(invalid_field_error(
            "userId",
            "userId must be a UUID string",
            &other.to_string(),
        )),
    }
}

/// Append one custom event.
///
/// The payload is open: `event` is required, `userId` and `email` are
/// lifted out when present, and every remaining field lands in the event's
/// metadata untouched. The client IP is derived server-side.
#[utoipa::path(
    post,
    path = "/api/v1/analytics/track",
    responses(
        (status = 200, description = "Appended, or soft failure", body = EventAck),
        (status = 400, description = "Missing event type", body = crate::domain::Error)
    ),
    tags = ["tracking"]
)]
#[post("/analytics/track")]
pub async fn track_event(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let Value::Object(mut object) = payload.into_inner() else {
        return Err(crate::domain::Error::invalid_request("expected a JSON object body"));
    };

    let event_type = object
        .get("event")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| missing_field_error("event"))?;
    let user_id = optional_user_id(&object)?;
    let email = object
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_owned);

    for lifted in ["event", "userId", "email"] {
        object.remove(lifted);
    }

    let event = NewEvent::new(event_type, user_id, email, client_ip(&req), Value::Object(object))
        .map_err(|err| missing_field_error("event").with_details(serde_json::json!({
            "reason": err.to_string(),
        })))?;

    match state.events.append(event).await {
        Ok(event_id) => Ok(HttpResponse::Ok().json(EventAck {
            success: true,
            event_id: Some(event_id),
            message: None,
        })),
        Err(error) => {
            warn!(%error, "event write failed; degrading to soft failure");
            Ok(HttpResponse::Ok().json(EventAck {
                success: false,
                event_id: None,
                message: Some("event tracking temporarily unavailable".to_owned()),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockEventSink, MockSettingsRepository, MockVisitorCommand, MockVisitorQuery, PersistenceError};
    use crate::domain::settings::Setting;
    use crate::inbound::http::test_utils::TestPorts;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use serde_json::json;

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
                .service(
                    web::scope("/api/v1")
                        .service(tracking_status)
                        .service(record_visitor)
                        .service(erase_visitor)
                        .service(track_event),
                ),
        )
        .await
    }

    fn switch_row(value: &str) -> Setting {
        Setting {
            key: TRACKING_ENABLED_KEY.to_owned(),
            value: value.to_owned(),
            updated_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn status_defaults_to_online_when_no_setting_row_exists() {
        let mut ports = TestPorts::default();
        let mut settings = MockSettingsRepository::new();
        settings.expect_get().returning(|_| Ok(None));
        let mut visitor_query = MockVisitorQuery::new();
        visitor_query.expect_count().returning(|| Ok(7));
        ports.settings = settings;
        ports.visitor_query = visitor_query;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/tracking-status")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "online");
        assert_eq!(body["visitors"], 7);
    }

    #[actix_web::test]
    async fn status_reports_offline_when_switch_disabled() {
        let mut ports = TestPorts::default();
        let mut settings = MockSettingsRepository::new();
        settings.expect_get().returning(|_| Ok(Some(switch_row("false"))));
        ports.settings = settings;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/tracking-status")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "offline");
        assert!(body.get("visitors").is_none());
    }

    #[actix_web::test]
    async fn status_fails_closed_when_store_unreachable() {
        let mut ports = TestPorts::default();
        let mut settings = MockSettingsRepository::new();
        settings
            .expect_get()
            .returning(|_| Err(PersistenceError::connection("refused")));
        ports.settings = settings;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/tracking-status")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "offline");
    }

    #[actix_web::test]
    async fn records_visitor_with_server_derived_ip() {
        let mut ports = TestPorts::default();
        let mut visitors = MockVisitorCommand::new();
        visitors
            .expect_record()
            .withf(|sighting, _| {
                sighting.visitor_id.as_ref() == "v1"
                    && sighting.ip_address == "203.0.113.9"
                    && sighting.device == Device::Mobile
            })
            .returning(|sighting, seen_at| {
                Ok(crate::domain::visitor::Visitor {
                    visitor_id: sighting.visitor_id,
                    email: sighting.email,
                    ip_address: sighting.ip_address,
                    device: sighting.device,
                    utm_source: sighting.utm_source,
                    time_on_site: 0,
                    converted: false,
                    created_at: seen_at,
                    last_seen: seen_at,
                })
            });
        ports.visitors = visitors;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/track-visitor")
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .set_json(json!({ "visitorId": "v1", "device": "mobile" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    #[actix_web::test]
    async fn missing_visitor_id_is_a_validation_error() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/track-visitor")
            .set_json(json!({ "device": "mobile" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "visitorId");
    }

    #[actix_web::test]
    async fn visitor_write_failure_soft_fails_with_http_200() {
        let mut ports = TestPorts::default();
        let mut visitors = MockVisitorCommand::new();
        visitors
            .expect_record()
            .returning(|_, _| Err(PersistenceError::connection("refused")));
        ports.visitors = visitors;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/track-visitor")
            .set_json(json!({ "visitorId": "v1", "device": "desktop" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn erasure_targets_exactly_the_requested_id() {
        let mut ports = TestPorts::default();
        let mut visitors = MockVisitorCommand::new();
        visitors
            .expect_erase()
            .withf(|id| id.as_ref() == "v1")
            .times(1)
            .returning(|_| Ok(2));
        ports.visitors = visitors;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::delete()
            .uri("/api/v1/track-visitor")
            .set_json(json!({ "visitorId": "v1" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    #[actix_web::test]
    async fn erasure_failure_is_a_hard_error() {
        let mut ports = TestPorts::default();
        let mut visitors = MockVisitorCommand::new();
        visitors
            .expect_erase()
            .returning(|_| Err(PersistenceError::connection("refused")));
        ports.visitors = visitors;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::delete()
            .uri("/api/v1/track-visitor")
            .set_json(json!({ "visitorId": "v1" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn event_ingestion_returns_the_new_event_id() {
        let mut ports = TestPorts::default();
        let mut events = MockEventSink::new();
        events
            .expect_append()
            .withf(|event| {
                event.event_type == "generation_started"
                    && event.metadata["style"] == "royal"
                    && event.email.as_deref() == Some("a@x.com")
            })
            .returning(|_| Ok(42));
        ports.events = events;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/analytics/track")
            .set_json(json!({
                "event": "generation_started",
                "email": "a@x.com",
                "style": "royal"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["eventId"], 42);
    }

    #[actix_web::test]
    async fn missing_event_type_is_a_validation_error() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/analytics/track")
            .set_json(json!({ "style": "royal" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn event_write_failure_soft_fails_with_http_200() {
        let mut ports = TestPorts::default();
        let mut events = MockEventSink::new();
        events
            .expect_append()
            .returning(|_| Err(PersistenceError::query("insert failed")));
        ports.events = events;

        let app = app_with(ports).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/analytics/track")
            .set_json(json!({ "event": "signup" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["success"], false);
    }
}
