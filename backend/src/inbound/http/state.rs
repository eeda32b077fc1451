//! Shared HTTP adapter state.
//!
//! Handlers accept this via `actix_web::web::Data` so they depend only on
//! domain ports and services and stay testable without I/O. The admin
//! credential set is constructed once from configuration and carried here;
//! handler logic never reads ambient environment state.

use std::sync::Arc;

use crate::domain::analytics::AnalyticsService;
use crate::domain::payment::CheckoutService;
use crate::domain::ports::{
    EventSink, PaymentRepository, SettingsRepository, VisitorCommand, VisitorQuery,
};
use crate::domain::trial::TrialGate;
use crate::inbound::http::auth::AdminCredentials;

/// Dependency bundle for HTTP handlers.
pub struct HttpState {
    pub visitors: Arc<dyn VisitorCommand>,
    pub visitor_query: Arc<dyn VisitorQuery>,
    pub events: Arc<dyn EventSink>,
    pub settings: Arc<dyn SettingsRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub trials: TrialGate,
    pub checkout: CheckoutService,
    pub analytics: AnalyticsService,
    pub admin: AdminCredentials,
}
