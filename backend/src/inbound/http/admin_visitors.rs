//! Admin visitor listing and CSV export.
//!
//! ```text
//! GET /api/v1/admin/visitors        Paginated, filtered listing + stats
//! GET /api/v1/admin/export-visitors CSV attachment of the filtered set
//! ```
//!
//! The stats block is computed over the full, unfiltered visitor set, not
//! the current page.

use std::borrow::Cow;

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::visitor::{Device, Visitor, VisitorFilter, VisitorStats};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminSession;
use crate::inbound::http::pagination::{PageRequest, total_pages};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::invalid_field_error;

/// Column header row of the visitor export.
pub const EXPORT_CSV_HEADER: &str = "Visitor ID,Email,IP Address,Device,Converted,Last Seen";

/// Query parameters shared by the listing and the export.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VisitorListParams {
    /// 1-based page number. Defaults to 1. Ignored by the export.
    pub page: Option<i64>,
    /// Page size. Defaults to 20, maximum 100. Ignored by the export.
    pub limit: Option<i64>,
    /// Case-insensitive partial match across visitor id and email.
    pub search: Option<String>,
    pub converted: Option<bool>,
    pub device: Option<String>,
}

fn parse_filter(params: &VisitorListParams) -> ApiResult<VisitorFilter> {
    let device = params
        .device
        .as_deref()
        .map(|raw| {
            raw.parse::<Device>()
                .map_err(|err| invalid_field_error("device", err.to_string(), raw))
        })
        .transpose()?;
    Ok(VisitorFilter {
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        converted: params.converted,
        device,
    })
}

/// One visitor row in the admin listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorBody {
    pub visitor_id: String,
    pub email: Option<String>,
    pub ip_address: String,
    pub device: Device,
    pub utm_source: Option<String>,
    pub time_on_site: i32,
    pub converted: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<Visitor> for VisitorBody {
    fn from(visitor: Visitor) -> Self {
        Self {
            visitor_id: visitor.visitor_id.into(),
            email: visitor.email,
            ip_address: visitor.ip_address,
            device: visitor.device,
            utm_source: visitor.utm_source,
            time_on_site: visitor.time_on_site,
            converted: visitor.converted,
            created_at: visitor.created_at,
            last_seen: visitor.last_seen,
        }
    }
}

/// Listing response: one page plus unfiltered stats.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorsPageBody {
    pub visitors: Vec<VisitorBody>,
    pub page: i64,
    pub total_pages: i64,
    pub stats: VisitorStats,
}

/// List visitors for operator review.
#[utoipa::path(
    get,
    path = "/api/v1/admin/visitors",
    params(VisitorListParams),
    responses(
        (status = 200, description = "One page of visitors", body = VisitorsPageBody),
        (status = 400, description = "Invalid parameters", body = crate::domain::Error),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[get("/admin/visitors")]
pub async fn admin_visitors(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    params: web::Query<VisitorListParams>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_new(params.page, params.limit)?;
    let filter = parse_filter(&params)?;

    let (visitors, total) = state
        .visitor_query
        .list(filter, page.offset(), page.limit())
        .await?;
    let stats = state.visitor_query.stats(Utc::now()).await?;

    Ok(HttpResponse::Ok().json(VisitorsPageBody {
        visitors: visitors.into_iter().map(VisitorBody::from).collect(),
        page: page.page(),
        total_pages: total_pages(total, page.limit()),
        stats,
    }))
}

/// Quote a CSV field only when it needs it.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn visitor_csv_line(visitor: &Visitor) -> String {
    format!(
        "{},{},{},{},{},{}",
        csv_field(visitor.visitor_id.as_ref()),
        csv_field(visitor.email.as_deref().unwrap_or_default()),
        csv_field(&visitor.ip_address),
        visitor.device,
        visitor.converted,
        visitor.last_seen.to_rfc3339(),
    )
}

/// Export the filtered visitor set as a CSV attachment.
#[utoipa::path(
    get,
    path = "/api/v1/admin/export-visitors",
    params(VisitorListParams),
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[get("/admin/export-visitors")]
pub async fn export_visitors(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    params: web::Query<VisitorListParams>,
) -> ApiResult<HttpResponse> {
    let filter = parse_filter(&params)?;
    let visitors = state.visitor_query.export(filter).await?;

    let mut body = String::from(EXPORT_CSV_HEADER);
    for visitor in &visitors {
        body.push('\n');
        body.push_str(&visitor_csv_line(visitor));
    }

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"visitors-export.csv\"",
        ))
        .body(body))
}
