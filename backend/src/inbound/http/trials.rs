//! Free-trial entitlement endpoints.
//!
//! ```text
//! POST /api/v1/free-trial/check   Has this email or IP used the trial?
//! POST /api/v1/free-trial/claim   Consume the entitlement
//! ```
//!
//! The entitlement is gated on the `{email, ip}` pair with OR semantics:
//! either field matching an existing record blocks a new claim.

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tracking::client_ip;
use crate::inbound::http::validation::{invalid_field_error, missing_field_error};

/// Request body naming the claimant.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialRequest {
    pub email: Option<String>,
}

/// Entitlement check response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialCheckBody {
    pub has_used_free_trial: bool,
}

/// Claim acknowledgement.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialClaimBody {
    pub success: bool,
}

fn required_email(raw: Option<&str>) -> ApiResult<String> {
    let email = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing_field_error("email"))?;
    if !email.contains('@') {
        return Err(invalid_field_error("email", "email must be an address", email));
    }
    Ok(email.to_ascii_lowercase())
}

/// Check whether the free trial is still available for this caller.
#[utoipa::path(
    post,
    path = "/api/v1/free-trial/check",
    request_body = TrialRequest,
    responses(
        (status = 200, description = "Entitlement state", body = TrialCheckBody),
        (status = 400, description = "Missing or invalid email", body = crate::domain::Error)
    ),
    tags = ["trials"]
)]
#[post("/free-trial/check")]
pub async fn check_free_trial(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<TrialRequest>,
) -> ApiResult<HttpResponse> {
    let email = required_email(payload.email.as_deref())?;
    let has_used = state
        .trials
        .has_used_free_trial(&email, &client_ip(&req))
        .await?;
    Ok(HttpResponse::Ok().json(TrialCheckBody {
        has_used_free_trial: has_used,
    }))
}

/// Consume the free-trial entitlement.
#[utoipa::path(
    post,
    path = "/api/v1/free-trial/claim",
    request_body = TrialRequest,
    responses(
        (status = 200, description = "Entitlement consumed", body = TrialClaimBody),
        (status = 400, description = "Missing or invalid email", body = crate::domain::Error),
        (status = 403, description = "Already claimed", body = crate::domain::Error)
    ),
    tags = ["trials"]
)]
#[post("/free-trial/claim")]
pub async fn claim_free_trial(
    state: web::Data<HttpState>,
    req: HttpRequest,
    payload: web::Json<TrialRequest>,
) -> ApiResult<HttpResponse> {
    let email = required_email(payload.email.as_deref())?;
    state.trials.claim(&email, &client_ip(&req)).await?;
    Ok(HttpResponse::Ok().json(TrialClaimBody { success: true }))
}
