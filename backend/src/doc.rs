//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API:
//! tracking ingestion, the kill-switch probe, free-trial and checkout
//! endpoints, and the bearer-authenticated admin surface. The generated
//! document backs Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the admin bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "admin_key",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Static admin API key configured at deployment."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Pawtrait backend API",
        description = "Visitor tracking ingestion, checkout, and the admin reporting surface."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::tracking::tracking_status,
        crate::inbound::http::tracking::record_visitor,
        crate::inbound::http::tracking::erase_visitor,
        crate::inbound::http::tracking::track_event,
        crate::inbound::http::trials::check_free_trial,
        crate::inbound::http::trials::claim_free_trial,
        crate::inbound::http::checkout::create_order,
        crate::inbound::http::checkout::verify_payment,
        crate::inbound::http::admin_analytics::admin_analytics,
        crate::inbound::http::admin_orders::admin_orders,
        crate::inbound::http::admin_visitors::admin_visitors,
        crate::inbound::http::admin_visitors::export_visitors,
        crate::inbound::http::admin_settings::get_settings,
        crate::inbound::http::admin_settings::update_settings,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::domain::analytics::AnalyticsBundle,
        crate::domain::analytics::PlatformTotals,
        crate::domain::analytics::PlanCount,
        crate::domain::analytics::RankedItem,
        crate::domain::analytics::RevenuePoint,
        crate::domain::analytics::TrendPoint,
        crate::domain::payment::Plan,
        crate::domain::payment::PaymentStatus,
        crate::domain::payment::OrderStats,
        crate::domain::visitor::Device,
        crate::domain::visitor::DeviceCount,
        crate::domain::visitor::SourceCount,
        crate::domain::visitor::VisitorStats,
        crate::inbound::http::admin_orders::OrderBody,
        crate::inbound::http::admin_orders::OrdersPageBody,
        crate::inbound::http::admin_settings::SettingsBody,
        crate::inbound::http::admin_visitors::VisitorBody,
        crate::inbound::http::admin_visitors::VisitorsPageBody,
        crate::inbound::http::checkout::CreateOrderBody,
        crate::inbound::http::checkout::CreateOrderRequest,
        crate::inbound::http::checkout::VerifyPaymentBody,
        crate::inbound::http::checkout::VerifyPaymentRequest,
        crate::inbound::http::tracking::EraseVisitorRequest,
        crate::inbound::http::tracking::EventAck,
        crate::inbound::http::tracking::TrackAck,
        crate::inbound::http::tracking::TrackVisitorRequest,
        crate::inbound::http::tracking::TrackingStatusBody,
        crate::inbound::http::trials::TrialCheckBody,
        crate::inbound::http::trials::TrialClaimBody,
        crate::inbound::http::trials::TrialRequest,
    )),
    tags(
        (name = "tracking", description = "Visitor and event ingestion plus the kill-switch probe"),
        (name = "trials", description = "Free-trial entitlement checks"),
        (name = "checkout", description = "Order creation and payment verification"),
        (name = "admin", description = "Bearer-authenticated operator surface"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn registers_every_public_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/tracking-status",
            "/api/v1/track-visitor",
            "/api/v1/analytics/track",
            "/api/v1/free-trial/check",
            "/api/v1/checkout/orders",
            "/api/v1/admin/analytics",
            "/api/v1/admin/visitors",
            "/api/v1/admin/export-visitors",
            "/api/v1/admin/orders",
            "/api/v1/admin/settings",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "OpenAPI document should describe {path}"
            );
        }
    }

    #[rstest]
    fn error_schema_exposes_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = schemas.get("Error").expect("Error schema registered");
        let serialised = serde_json::to_string(error).expect("serialisable schema");
        assert!(serialised.contains("\"code\""));
        assert!(serialised.contains("\"message\""));
    }

    #[rstest]
    fn admin_security_scheme_is_bearer() {
        let doc = ApiDoc::openapi();
        let schemes = &doc
            .components
            .as_ref()
            .expect("components")
            .security_schemes;
        assert!(schemes.contains_key("admin_key"));
    }
}
