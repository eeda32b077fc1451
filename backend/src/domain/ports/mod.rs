//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Inbound adapters call these traits; outbound adapters implement them.
//! Persistence-backed ports report [`PersistenceError`], which maps onto the
//! domain error taxonomy in one place here.

mod analytics;
mod payments;
mod settings;
mod tracking;
mod trials;

pub use analytics::AnalyticsQuery;
pub use payments::{PaymentGateway, PaymentRepository, SignatureVerifier};
pub use settings::SettingsRepository;
pub use tracking::{EventSink, VisitorCommand, VisitorQuery};
pub use trials::TrialRepository;

#[cfg(test)]
pub use analytics::MockAnalyticsQuery;
#[cfg(test)]
pub use payments::{MockPaymentGateway, MockPaymentRepository, MockSignatureVerifier};
#[cfg(test)]
pub use settings::MockSettingsRepository;
#[cfg(test)]
pub use tracking::{MockEventSink, MockVisitorCommand, MockVisitorQuery};
#[cfg(test)]
pub use trials::MockTrialRepository;

use crate::domain::Error;

/// Failure categories reported by persistence-backed ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The store could not be reached or a connection could not be checked
    /// out.
    #[error("storage connection failed: {message}")]
    Connection { message: String },

    /// The store rejected or failed the operation.
    #[error("storage query failed: {message}")]
    Query { message: String },
}

impl PersistenceError {
    /// Create a connection-category error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query-category error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

impl From<PersistenceError> for Error {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::Connection { message } => Self::service_unavailable(message),
            PersistenceError::Query { message } => Self::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(PersistenceError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(PersistenceError::query("bad sql"), ErrorCode::InternalError)]
    fn maps_persistence_failures_to_domain_codes(
        #[case] error: PersistenceError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(Error::from(error).code(), expected);
    }
}
