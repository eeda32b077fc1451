//! Checkout endpoints: order creation and payment verification.
//!
//! ```text
//! POST /api/v1/checkout/orders   Create a payment record + gateway order
//! POST /api/v1/checkout/verify   Verify a gateway signature, mark paid
//! ```
//!
//! Both paths are critical: failures block the caller, unlike the
//! soft-failing telemetry endpoints.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::{PaymentStatus, PaymentVerification, Plan};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field_error, missing_field_error};

/// Order creation payload.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub plan: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Order creation response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub order_id: i64,
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub plan: Plan,
}

/// Create a payment record and its external gateway order.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderBody),
        (status = 400, description = "Unknown plan", body = crate::domain::Error),
        (status = 503, description = "Gateway unavailable", body = crate::domain::Error)
    ),
    tags = ["checkout"]
)]
#[post("/checkout/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let raw_plan = body
        .plan
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing_field_error("plan"))?;
    let plan = raw_plan
        .parse::<Plan>()
        .map_err(|err| invalid_field_error("plan", err.to_string(), raw_plan))?;

    let payment = state
        .checkout
        .create_order(plan, body.user_id, body.email.filter(|e| !e.trim().is_empty()))
        .await?;

    Ok(HttpResponse::Created().json(CreateOrderBody {
        order_id: payment.id,
        gateway_order_id: payment.gateway_order_id,
        amount_minor: payment.amount_minor,
        currency: payment.currency,
        plan: payment.plan,
    }))
}

/// Payment verification payload from the gateway callback.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub signature: Option<String>,
}

/// Verification response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentBody {
    pub success: bool,
    pub status: PaymentStatus,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing_field_error(field))
}

/// Verify a gateway signature and mark the payment paid.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified", body = VerifyPaymentBody),
        (status = 400, description = "Missing field or bad signature", body = crate::domain::Error)
    ),
    tags = ["checkout"]
)]
#[post("/checkout/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyPaymentRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let verification = PaymentVerification {
        gateway_order_id: required(body.gateway_order_id, "gatewayOrderId")?,
        gateway_payment_id: required(body.gateway_payment_id, "gatewayPaymentId")?,
        signature: required(body.signature, "signature")?,
    };

    let payment = state.checkout.verify_payment(verification).await?;
    Ok(HttpResponse::Ok().json(VerifyPaymentBody {
        success: true,
        status: payment.status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{NewPayment, Payment};
    use crate::domain::ports::{
        MockEventSink, MockPaymentGateway, MockPaymentRepository, MockSignatureVerifier,
    };
    use crate::inbound::http::test_utils::TestPorts;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use serde_json::{Value, json};

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
                        .service(create_order)
                        .service(verify_payment),
                ),
        )
        .await
    }

    fn payment_from(new: &NewPayment, id: i64) -> Payment {
        Payment {
            id,
            user_id: new.user_id,
            email: new.email.clone(),
            amount_minor: new.amount_minor,
            currency: new.currency.clone(),
            plan: new.plan,
            gateway_order_id: new.gateway_order_id.clone(),
            gateway_payment_id: None,
            gateway_signature: None,
            status: PaymentStatus::Created,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    #[actix_web::test]
    async fn creates_an_order_for_a_known_plan() {
        let mut payments = MockPaymentRepository::new();
        payments
            .expect_insert()
            .returning(|new| Ok(payment_from(&new, 9)));
        payments
            .expect_attach_gateway_order()
            .returning(|id, gateway_order_id| {
                let mut payment = payment_from(
                    &NewPayment {
                        user_id: None,
                        email: None,
                        amount_minor: Plan::PortraitPack.amount_minor(),
                        currency: "INR".to_owned(),
                        plan: Plan::PortraitPack,
                        gateway_order_id: gateway_order_id.to_owned(),
                    },
                    id,
                );
                payment.gateway_order_id = gateway_order_id.to_owned();
                Ok(payment)
            });
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_order()
            .withf(|amount, currency, _| *amount == 49_900 && currency == "INR")
            .returning(|_, _, _| Ok("order_xyz".to_owned()));
        let mut ports = TestPorts::default();
        ports.payments = payments;
        ports.gateway = gateway;
        let app = app_with(ports).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/checkout/orders")
            .set_json(json!({ "plan": "portrait_pack", "email": "a@x.com" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["gatewayOrderId"], "order_xyz");
        assert_eq!(body["amountMinor"], 49_900);
    }

    #[actix_web::test]
    async fn unknown_plan_is_rejected() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/checkout/orders")
            .set_json(json!({ "plan": "mega_bundle" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn bad_signature_is_a_blocking_error() {
        let mut verifier = MockSignatureVerifier::new();
        verifier.expect_verify().returning(|_| Ok(false));
        let mut ports = TestPorts::default();
        ports.verifier = verifier;
        let app = app_with(ports).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/checkout/verify")
            .set_json(json!({
                "gatewayOrderId": "order_xyz",
                "gatewayPaymentId": "pay_1",
                "signature": "bad"
            }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn verified_payment_reports_paid() {
        let mut verifier = MockSignatureVerifier::new();
        verifier.expect_verify().returning(|_| Ok(true));
        let mut payments = MockPaymentRepository::new();
        payments.expect_mark_paid().returning(|order, pay, sig| {
            let mut payment = payment_from(
                &NewPayment {
                    user_id: None,
                    email: None,
                    amount_minor: Plan::PortraitSingle.amount_minor(),
                    currency: "INR".to_owned(),
                    plan: Plan::PortraitSingle,
                    gateway_order_id: order.to_owned(),
                },
                3,
            );
            payment.status = PaymentStatus::Paid;
            payment.gateway_payment_id = Some(pay.to_owned());
            payment.gateway_signature = Some(sig.to_owned());
            payment.paid_at = Some(Utc::now());
            Ok(payment)
        });
        let mut events = MockEventSink::new();
        events.expect_append().returning(|_| Ok(5));
        let mut ports = TestPorts::default();
        ports.verifier = verifier;
        ports.payments = payments;
        ports.events = events;
        let app = app_with(ports).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/checkout/verify")
            .set_json(json!({
                "gatewayOrderId": "order_xyz",
                "gatewayPaymentId": "pay_1",
                "signature": "good"
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "paid");
    }

    #[actix_web::test]
    async fn missing_signature_field_is_a_validation_error() {
        let app = app_with(TestPorts::default()).await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/checkout/verify")
            .set_json(json!({ "gatewayOrderId": "order_xyz", "gatewayPaymentId": "pay_1" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "signature");
    }
}
