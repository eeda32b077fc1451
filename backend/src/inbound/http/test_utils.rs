//! Handler test support: a bundle of mocked ports assembled into
//! [`HttpState`].
//!
//! Tests override only the mocks they care about; untouched mocks panic on
//! use, which doubles as proof that a code path performed no storage I/O.

use std::sync::Arc;

use crate::domain::analytics::AnalyticsService;
use crate::domain::payment::CheckoutService;
use crate::domain::ports::{
    MockAnalyticsQuery, MockEventSink, MockPaymentGateway, MockPaymentRepository,
    MockSettingsRepository, MockSignatureVerifier, MockTrialRepository, MockVisitorCommand,
    MockVisitorQuery,
};
use crate::domain::trial::TrialGate;
use crate::inbound::http::auth::AdminCredentials;
use crate::inbound::http::state::HttpState;

/// Admin bearer token accepted by states built from [`TestPorts`].
pub(crate) const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Mocked port bundle with per-test overrides.
#[derive(Default)]
pub(crate) struct TestPorts {
    pub visitors: MockVisitorCommand,
    pub visitor_query: MockVisitorQuery,
    pub events: MockEventSink,
    pub settings: MockSettingsRepository,
    pub payments: MockPaymentRepository,
    pub trials: MockTrialRepository,
    pub gateway: MockPaymentGateway,
    pub verifier: MockSignatureVerifier,
    pub analytics: MockAnalyticsQuery,
}

impl TestPorts {
    /// Assemble the mocks into handler state with the test admin key.
    pub(crate) fn into_state(self) -> HttpState {
        let events = Arc::new(self.events);
        let payments = Arc::new(self.payments);
        let checkout = CheckoutService::new(
            payments.clone(),
            Arc::new(self.gateway),
            Arc::new(self.verifier),
            events.clone(),
        );
        HttpState {
            visitors: Arc::new(self.visitors),
            visitor_query: Arc::new(self.visitor_query),
            events,
            settings: Arc::new(self.settings),
            payments,
            trials: TrialGate::new(Arc::new(self.trials)),
            checkout,
            analytics: AnalyticsService::new(Arc::new(self.analytics)),
            admin: AdminCredentials::new(TEST_ADMIN_KEY.to_owned(), None),
        }
    }
}
