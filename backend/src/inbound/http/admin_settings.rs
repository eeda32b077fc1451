//! Admin settings endpoints for the tracking kill-switch.
//!
//! ```text
//! GET  /api/v1/admin/settings   Read the switch
//! POST /api/v1/admin/settings   Flip the switch (strict boolean)
//! ```
//!
//! Every successful write appends an immutable audit event capturing the
//! old and new values and the acting credential's fingerprint.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::events::NewEvent;
use crate::domain::settings::{TRACKING_ENABLED_KEY, tracking_enabled, tracking_value};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminSession;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{invalid_field_error, missing_field_error};

/// Current switch state.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    pub visitor_tracking_enabled: bool,
    /// Absent when the switch has never been written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read the tracking switch.
#[utoipa::path(
    get,
    path = "/api/v1/admin/settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsBody),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[get("/admin/settings")]
pub async fn get_settings(
    _admin: AdminSession,
    state: web::Data<HttpState>,
) -> ApiResult<HttpResponse> {
    let setting = state.settings.get(TRACKING_ENABLED_KEY).await?;
    Ok(HttpResponse::Ok().json(SettingsBody {
        visitor_tracking_enabled: tracking_enabled(setting.as_ref()),
        updated_at: setting.map(|row| row.updated_at),
    }))
}

/// Update the tracking switch.
///
/// `visitorTrackingEnabled` must be a JSON boolean; strings such as
/// `"true"` are rejected before anything is written.
#[utoipa::path(
    post,
    path = "/api/v1/admin/settings",
    responses(
        (status = 200, description = "Updated settings", body = SettingsBody),
        (status = 400, description = "Non-boolean value", body = crate::domain::Error),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[post("/admin/settings")]
pub async fn update_settings(
    admin: AdminSession,
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let enabled = match payload.get("visitorTrackingEnabled") {
        Some(Value::Bool(enabled)) => *enabled,
        Some(other) => {
            return Err(invalid_field_error(
                "visitorTrackingEnabled",
                "visitorTrackingEnabled must be a boolean",
                &other.to_string(),
            ));
        }
        None => return Err(missing_field_error("visitorTrackingEnabled")),
    };

    let previous = state.settings.get(TRACKING_ENABLED_KEY).await?;
    let updated = state
        .settings
        .upsert(TRACKING_ENABLED_KEY, tracking_value(enabled))
        .await?;
    info!(enabled, actor = admin.actor(), "tracking switch updated");

    let audit = NewEvent::setting_audit(
        TRACKING_ENABLED_KEY,
        previous.as_ref().map(|row| row.value.as_str()),
        &updated.value,
        admin.actor(),
    );
    if let Err(error) = state.events.append(audit).await {
        warn!(%error, "settings audit event dropped");
    }

    Ok(HttpResponse::Ok().json(SettingsBody {
        visitor_tracking_enabled: enabled,
        updated_at: Some(updated.updated_at),
    }))
}
