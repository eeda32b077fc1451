//! Checkout payment records and the order lifecycle.
//!
//! A payment moves `created → paid`; the transition happens only after the
//! gateway signature verifies. The gateway order id starts as a placeholder
//! and is replaced once the external order exists, so a narrow window is
//! tolerated where the record holds a non-resolvable external id.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::events::NewEvent;
use crate::domain::ports::{EventSink, PaymentGateway, PaymentRepository, SignatureVerifier};

/// Gateway order id stored until the external order is created.
pub const PLACEHOLDER_GATEWAY_ORDER_ID: &str = "pending";

/// Purchasable plans and their prices in minor currency units (INR paise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    PortraitPack,
    PortraitSingle,
}

/// Error returned when parsing a plan identifier from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan identifier")]
pub struct ParsePlanError;

impl Plan {
    /// Price in minor currency units.
    pub fn amount_minor(self) -> i64 {
        match self {
            Self::PortraitPack => 49_900,
            Self::PortraitSingle => 9_900,
        }
    }

    /// Billing currency for every plan.
    pub fn currency(self) -> &'static str {
        "INR"
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortraitPack => f.write_str("portrait_pack"),
            Self::PortraitSingle => f.write_str("portrait_single"),
        }
    }
}

impl FromStr for Plan {
    type Err = ParsePlanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "portrait_pack" => Ok(Self::PortraitPack),
            "portrait_single" => Ok(Self::PortraitSingle),
            _ => Err(ParsePlanError),
        }
    }
}

/// Lifecycle state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Paid,
}

/// Error returned when parsing a payment status from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status")]
pub struct ParsePaymentStatusError;

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Paid => f.write_str("paid"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParsePaymentStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "paid" => Ok(Self::Paid),
            _ => Err(ParsePaymentStatusError),
        }
    }
}

/// A stored payment record.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub plan: Plan,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Payload for inserting a `created` payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub plan: Plan,
    pub gateway_order_id: String,
}

/// Inputs to signature verification, as supplied by the gateway callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Filters applied to the admin orders listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<PaymentStatus>,
}

/// One order row joined with the buyer's email for operator review.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub payment: Payment,
    /// Denormalised buyer email; `"Unknown"` when the user join misses.
    pub user_email: String,
}

/// Stats block computed over the full, unfiltered order set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    /// Sum of paid order amounts, in minor currency units.
    pub total_revenue_minor: i64,
    /// Mean paid order amount, in minor currency units.
    pub average_order_value_minor: i64,
}

/// Checkout use-case: order creation against the gateway and payment
/// verification.
#[derive(Clone)]
pub struct CheckoutService {
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: Arc<dyn SignatureVerifier>,
    events: Arc<dyn EventSink>,
}

impl CheckoutService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Arc<dyn SignatureVerifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            payments,
            gateway,
            verifier,
            events,
        }
    }

    /// Create a payment record and the matching external gateway order.
    ///
    /// The record is inserted first with [`PLACEHOLDER_GATEWAY_ORDER_ID`];
    /// the placeholder is replaced once the gateway responds. Gateway
    /// failure is blocking: this is a critical path, not telemetry.
    pub async fn create_order(
        &self,
        plan: Plan,
        user_id: Option<Uuid>,
        email: Option<String>,
    ) -> Result<Payment, Error> {
        let payment = self
            .payments
            .insert(NewPayment {
                user_id,
                email,
                amount_minor: plan.amount_minor(),
                currency: plan.currency().to_owned(),
                plan,
                gateway_order_id: PLACEHOLDER_GATEWAY_ORDER_ID.to_owned(),
            })
            .await
            .map_err(Error::from)?;

        let gateway_order_id = self
            .gateway
            .create_order(payment.amount_minor, &payment.currency, payment.id)
            .await?;

        let payment = self
            .payments
            .attach_gateway_order(payment.id, &gateway_order_id)
            .await
            .map_err(Error::from)?;
        info!(payment_id = payment.id, %gateway_order_id, "checkout order created");
        Ok(payment)
    }

    /// Verify a gateway signature and transition the record to `paid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] when the signature does not
    /// verify; the record is left untouched.
    pub async fn verify_payment(&self, verification: PaymentVerification) -> Result<Payment, Error> {
        if !self.verifier.verify(&verification).await? {
            return Err(Error::invalid_request("payment signature verification failed"));
        }

        let payment = self
            .payments
            .mark_paid(
                &verification.gateway_order_id,
                &verification.gateway_payment_id,
                &verification.signature,
            )
            .await
            .map_err(Error::from)?;

        // Audit append is telemetry: a sink outage must not undo a payment.
        let audit = NewEvent::payment_audit(
            &verification.gateway_order_id,
            &verification.gateway_payment_id,
        );
        if let Err(error) = self.events.append(audit).await {
            warn!(%error, payment_id = payment.id, "payment audit event dropped");
        }
        Ok(payment)
    }
}
