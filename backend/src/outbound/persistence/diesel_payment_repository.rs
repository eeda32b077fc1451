//! PostgreSQL-backed `PaymentRepository` implementation.
//!
//! The admin orders listing left-joins the users table so each row carries
//! the buyer's account email; a missed join reads as `"Unknown"`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::payment::{
    NewPayment, OrderFilter, OrderRecord, OrderStats, Payment, PaymentStatus, Plan,
};
use crate::domain::ports::{PaymentRepository, PersistenceError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewPaymentRow, PaymentRow};
use super::pool::DbPool;
use super::schema::{payments, users};

/// Buyer email shown when no user record matches the payment.
const UNKNOWN_BUYER: &str = "Unknown";

/// Diesel-backed implementation of the `PaymentRepository` port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

type OrdersJoin = diesel::helper_types::LeftJoin<payments::table, users::table>;

/// Apply the admin filter to a boxed orders query.
fn filtered(filter: &OrderFilter) -> diesel::helper_types::IntoBoxed<'static, OrdersJoin, Pg> {
    let mut query = payments::table.left_join(users::table).into_boxed();
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            payments::gateway_order_id
                .ilike(pattern.clone())
                .nullable()
                .or(payments::email.ilike(pattern.clone()))
                .or(users::email.nullable().ilike(pattern)),
        );
    }
    if let Some(status) = filter.status {
        query = query.filter(payments::status.eq(status.to_string()));
    }
    query
}

/// Convert a database row to a domain payment.
fn row_to_payment(row: PaymentRow) -> Result<Payment, PersistenceError> {
    let plan = row
        .plan
        .parse::<Plan>()
        .map_err(|_| PersistenceError::query(format!("stored plan unknown: {}", row.plan)))?;
    let status = row.status.parse::<PaymentStatus>().map_err(|_| {
        PersistenceError::query(format!("stored payment status unknown: {}", row.status))
    })?;
    Ok(Payment {
        id: row.id,
        user_id: row.user_id,
        email: row.email,
        amount_minor: row.amount_minor,
        currency: row.currency,
        plan,
        gateway_order_id: row.gateway_order_id,
        gateway_payment_id: row.gateway_payment_id,
        gateway_signature: row.gateway_signature,
        status,
        created_at: row.created_at,
        paid_at: row.paid_at,
    })
}

/// Fold the paid order amounts into the admin stats block.
fn compute_order_stats(paid_amounts: &[i64]) -> OrderStats {
    let total: i64 = paid_amounts.iter().sum();
    let average = if paid_amounts.is_empty() {
        0
    } else {
        total / paid_amounts.len() as i64
    };
    OrderStats {
        total_revenue_minor: total,
        average_order_value_minor: average,
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn insert(&self, payment: NewPayment) -> Result<Payment, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let plan = payment.plan.to_string();
        let status = PaymentStatus::Created.to_string();
        let row = NewPaymentRow {
            user_id: payment.user_id,
            email: payment.email.as_deref(),
            amount_minor: payment.amount_minor,
            currency: &payment.currency,
            plan: &plan,
            gateway_order_id: &payment.gateway_order_id,
            status: &status,
            created_at: Utc::now(),
        };
        let stored: PaymentRow = diesel::insert_into(payments::table)
            .values(&row)
            .returning(PaymentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_payment(stored)
    }

    async fn attach_gateway_order(
        &self,
        id: i64,
        gateway_order_id: &str,
    ) -> Result<Payment, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored: PaymentRow = diesel::update(payments::table.find(id))
            .set(payments::gateway_order_id.eq(gateway_order_id))
            .returning(PaymentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_payment(stored)
    }

    async fn mark_paid(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<Payment, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored: PaymentRow = diesel::update(
            payments::table.filter(payments::gateway_order_id.eq(gateway_order_id)),
        )
        .set((
            payments::status.eq(PaymentStatus::Paid.to_string()),
            payments::gateway_payment_id.eq(gateway_payment_id),
            payments::gateway_signature.eq(signature),
            payments::paid_at.eq(Some(Utc::now())),
        ))
        .returning(PaymentRow::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        row_to_payment(stored)
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<OrderRecord>, i64), PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(PaymentRow, Option<String>)> = filtered(&filter)
            .order(payments::created_at.desc())
            .offset(offset)
            .limit(limit)
            .select((PaymentRow::as_select(), users::email.nullable()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let total: i64 = filtered(&filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let orders = rows
            .into_iter()
            .map(|(row, user_email)| {
                Ok(OrderRecord {
                    payment: row_to_payment(row)?,
                    user_email: user_email.unwrap_or_else(|| UNKNOWN_BUYER.to_owned()),
                })
            })
            .collect::<Result<Vec<_>, PersistenceError>>()?;
        Ok((orders, total))
    }

    async fn order_stats(&self) -> Result<OrderStats, PersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let paid_amounts: Vec<i64> = payments::table
            .filter(payments::status.eq(PaymentStatus::Paid.to_string()))
            .select(payments::amount_minor)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(compute_order_stats(&paid_amounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payment_row(plan: &str, status: &str) -> PaymentRow {
        PaymentRow {
            id: 1,
            user_id: None,
            email: None,
            amount_minor: 49_900,
            currency: "INR".to_owned(),
            plan: plan.to_owned(),
            gateway_order_id: "order_abc".to_owned(),
            gateway_payment_id: None,
            gateway_signature: None,
            status: status.to_owned(),
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    #[rstest]
    fn maps_known_plan_and_status() {
        let payment = row_to_payment(payment_row("portrait_pack", "created")).expect("valid row");
        assert_eq!(payment.plan, Plan::PortraitPack);
        assert_eq!(payment.status, PaymentStatus::Created);
    }

    #[rstest]
    #[case("mega_bundle", "created")]
    #[case("portrait_pack", "refunded")]
    fn rejects_unknown_stored_values(#[case] plan: &str, #[case] status: &str) {
        assert!(row_to_payment(payment_row(plan, status)).is_err());
    }

    #[rstest]
    #[case(&[], 0, 0)]
    #[case(&[49_900], 49_900, 49_900)]
    #[case(&[49_900, 9_900], 59_800, 29_900)]
    fn folds_order_stats(#[case] amounts: &[i64], #[case] total: i64, #[case] average: i64) {
        let stats = compute_order_stats(amounts);
        assert_eq!(stats.total_revenue_minor, total);
        assert_eq!(stats.average_order_value_minor, average);
    }
}
