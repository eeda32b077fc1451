//! Port for free-trial entitlement records.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::ports::PersistenceError;
use crate::domain::trial::{NewTrial, Trial};

/// Store of consumed free-trial entitlements.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrialRepository: Send + Sync {
    /// Find a trial whose email OR IP address matches; either match blocks
    /// a new claim.
    async fn find_matching(
        &self,
        email: &str,
        ip_address: &str,
    ) -> Result<Option<Trial>, PersistenceError>;

    /// Record consumption of the entitlement.
    async fn insert(&self, trial: NewTrial) -> Result<Trial, PersistenceError>;
}
