//! Ports for payment records, the external gateway, and signature
//! verification.
//!
//! The gateway SDK itself stays outside this crate; these seams carry
//! exactly what the checkout flow needs.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::Error;
use crate::domain::payment::{
    NewPayment, OrderFilter, OrderRecord, OrderStats, Payment, PaymentVerification,
};
use crate::domain::ports::PersistenceError;

/// Store of payment records plus the admin orders listing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a `created` payment carrying the placeholder gateway order
    /// id.
    async fn insert(&self, payment: NewPayment) -> Result<Payment, PersistenceError>;

    /// Replace the placeholder with the real gateway order id.
    async fn attach_gateway_order(
        &self,
        id: i64,
        gateway_order_id: &str,
    ) -> Result<Payment, PersistenceError>;

    /// Transition the record to `paid`, storing the gateway payment id and
    /// signature and stamping `paid_at`.
    async fn mark_paid(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<Payment, PersistenceError>;

    /// One page of orders matching the filter (joined with buyer email),
    /// plus the filtered total.
    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<OrderRecord>, i64), PersistenceError>;

    /// Stats computed over the full, unfiltered order set.
    async fn order_stats(&self) -> Result<OrderStats, PersistenceError>;
}

/// External payment gateway seam. Implementations wrap the provider's SDK;
/// failures surface as [`Error::service_unavailable`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create the external order and return its gateway identifier.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: i64,
    ) -> Result<String, Error>;
}

/// Signature verification seam for gateway payment callbacks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// True when the supplied signature matches the order and payment ids.
    async fn verify(&self, verification: &PaymentVerification) -> Result<bool, Error>;
}
