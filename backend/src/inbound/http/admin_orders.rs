//! Admin orders listing.
//!
//! ```text
//! GET /api/v1/admin/orders?page&limit&search&status
//! ```
//!
//! Each row joins the buyer's account email (`"Unknown"` when the join
//! misses). The stats block is computed over the full, unfiltered order
//! set.

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::{OrderFilter, OrderRecord, OrderStats, PaymentStatus, Plan};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AdminSession;
use crate::inbound::http::pagination::{PageRequest, total_pages};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::invalid_field_error;

/// Query parameters for the orders listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 20, maximum 100.
    pub limit: Option<i64>,
    /// Case-insensitive partial match across gateway order id and emails.
    pub search: Option<String>,
    /// Lifecycle filter: `created` or `paid`.
    pub status: Option<String>,
}

/// One order row in the admin listing.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: i64,
    pub user_id: Option<Uuid>,
    /// Buyer account email, `"Unknown"` when no user matches.
    pub user_email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub plan: Plan,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<OrderRecord> for OrderBody {
    fn from(record: OrderRecord) -> Self {
        let payment = record.payment;
        Self {
            id: payment.id,
            user_id: payment.user_id,
            user_email: record.user_email,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            plan: payment.plan,
            gateway_order_id: payment.gateway_order_id,
            gateway_payment_id: payment.gateway_payment_id,
            status: payment.status,
            created_at: payment.created_at,
            paid_at: payment.paid_at,
        }
    }
}

/// Listing response: one page plus unfiltered stats.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersPageBody {
    pub orders: Vec<OrderBody>,
    pub page: i64,
    pub total_pages: i64,
    pub stats: OrderStats,
}

/// List checkout orders for operator review.
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(OrderListParams),
    responses(
        (status = 200, description = "One page of orders", body = OrdersPageBody),
        (status = 400, description = "Invalid parameters", body = crate::domain::Error),
        (status = 401, description = "Unauthorised", body = crate::domain::Error)
    ),
    security(("admin_key" = [])),
    tags = ["admin"]
)]
#[get("/admin/orders")]
pub async fn admin_orders(
    _admin: AdminSession,
    state: web::Data<HttpState>,
    params: web::Query<OrderListParams>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::try_new(params.page, params.limit)?;
    let status = params
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<PaymentStatus>()
                .map_err(|err| invalid_field_error("status", err.to_string(), raw))
        })
        .transpose()?;
    let filter = OrderFilter {
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        status,
    };

    let (orders, total) = state
        .payments
        .list_orders(filter, page.offset(), page.limit())
        .await?;
    let stats = state.payments.order_stats().await?;

    Ok(HttpResponse::Ok().json(OrdersPageBody {
        orders: orders.into_iter().map(OrderBody::from).collect(),
        page: page.page(),
        total_pages: total_pages(total, page.limit()),
        stats,
    }))
}
