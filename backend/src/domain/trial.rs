//! Free-trial entitlement records.
//!
//! At most one effective free trial exists per email OR per IP address; the
//! lookup is an OR across both columns, so either match blocks a new claim.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use crate::domain::Error;
use crate::domain::ports::TrialRepository;

/// A stored trial consumption record.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub id: i64,
    pub email: String,
    pub ip_address: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a trial claim.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrial {
    pub email: String,
    pub ip_address: String,
}

/// Gate deciding whether a `{email, ip}` pair may still claim the free
/// trial.
#[derive(Clone)]
pub struct TrialGate {
    trials: Arc<dyn TrialRepository>,
}

impl TrialGate {
    pub fn new(trials: Arc<dyn TrialRepository>) -> Self {
        Self { trials }
    }

    /// True when a stored trial matches the email or the IP address.
    pub async fn has_used_free_trial(&self, email: &str, ip_address: &str) -> Result<bool, Error> {
        let existing = self
            .trials
            .find_matching(email, ip_address)
            .await
            .map_err(Error::from)?;
        Ok(existing.is_some())
    }

    /// Record consumption of the entitlement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::forbidden`] with `hasUsedFreeTrial: true` details
    /// when either the email or the IP has already claimed a trial.
    pub async fn claim(&self, email: &str, ip_address: &str) -> Result<Trial, Error> {
        if self.has_used_free_trial(email, ip_address).await? {
            return Err(Error::forbidden("free trial already claimed")
                .with_details(json!({ "hasUsedFreeTrial": true })));
        }

        let trial = self
            .trials
            .insert(NewTrial {
                email: email.to_owned(),
                ip_address: ip_address.to_owned(),
            })
            .await
            .map_err(Error::from)?;
        info!(trial_id = trial.id, "free trial claimed");
        Ok(trial)
    }
}
