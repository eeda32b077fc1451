//! Assembly of handler state from configuration and adapters.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::Error;
use crate::domain::analytics::AnalyticsService;
use crate::domain::payment::{CheckoutService, PaymentVerification};
use crate::domain::ports::{PaymentGateway, SignatureVerifier};
use crate::domain::trial::TrialGate;
use crate::inbound::http::auth::AdminCredentials;
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::{
    DbPool, DieselAnalyticsQuery, DieselEventSink, DieselPaymentRepository,
    DieselSettingsRepository, DieselTrialRepository, DieselVisitorRepository,
};

/// The checkout seam: the external gateway plus its signature verifier.
pub(crate) struct GatewaySeam {
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

/// Placeholder seam used until gateway credentials are configured.
///
/// Checkout endpoints answer 503 instead of the process refusing to start,
/// so the tracking and admin surfaces stay usable without payment keys.
struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_order(
        &self,
        _amount_minor: i64,
        _currency: &str,
        _receipt: i64,
    ) -> Result<String, Error> {
        warn!("checkout attempted without a configured payment gateway");
        Err(Error::service_unavailable("payment gateway is not configured"))
    }
}

#[async_trait]
impl SignatureVerifier for UnconfiguredGateway {
    async fn verify(&self, _verification: &PaymentVerification) -> Result<bool, Error> {
        warn!("verification attempted without a configured payment gateway");
        Err(Error::service_unavailable("payment gateway is not configured"))
    }
}

impl GatewaySeam {
    pub(crate) fn unconfigured() -> Self {
        let seam = Arc::new(UnconfiguredGateway);
        Self {
            gateway: seam.clone(),
            verifier: seam,
        }
    }
}

/// Wire the Diesel adapters and domain services into handler state.
pub(crate) fn build_http_state(
    pool: &DbPool,
    admin: AdminCredentials,
    seam: GatewaySeam,
) -> HttpState {
    let visitors = Arc::new(DieselVisitorRepository::new(pool.clone()));
    let events = Arc::new(DieselEventSink::new(pool.clone()));
    let payments = Arc::new(DieselPaymentRepository::new(pool.clone()));

    let checkout = CheckoutService::new(
        payments.clone(),
        seam.gateway,
        seam.verifier,
        events.clone(),
    );
    let trials = TrialGate::new(Arc::new(DieselTrialRepository::new(pool.clone())));
    let analytics = AnalyticsService::new(Arc::new(DieselAnalyticsQuery::new(pool.clone())));

    HttpState {
        visitors: visitors.clone(),
        visitor_query: visitors,
        events,
        settings: Arc::new(DieselSettingsRepository::new(pool.clone())),
        payments,
        trials,
        checkout,
        analytics,
        admin,
    }
}
