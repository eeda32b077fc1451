//! Consent state and the tracking gate.
//!
//! A consent decision ages out after a year; past that point the user is
//! treated as undecided and must be re-prompted. The remote kill-switch is
//! checked before consent even matters, so the gate is a pure two-stage
//! function over both inputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days a recorded consent decision stays valid.
pub const CONSENT_VALIDITY_DAYS: i64 = 365;

/// A recorded consent decision with its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDecision {
    /// Whether tracking was allowed.
    pub granted: bool,
    pub decided_at: DateTime<Utc>,
}

impl ConsentDecision {
    pub fn granted(now: DateTime<Utc>) -> Self {
        Self {
            granted: true,
            decided_at: now,
        }
    }

    pub fn revoked(now: DateTime<Utc>) -> Self {
        Self {
            granted: false,
            decided_at: now,
        }
    }
}

/// Effective consent state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentStatus {
    /// Tracking allowed by an unexpired grant.
    Granted,
    /// Tracking denied by an unexpired refusal.
    Revoked,
    /// No decision on record, or the decision expired.
    Undecided,
}

/// Evaluate a stored decision at `now`, expiring decisions older than
/// [`CONSENT_VALIDITY_DAYS`].
pub fn consent_status(decision: Option<&ConsentDecision>, now: DateTime<Utc>) -> ConsentStatus {
    match decision {
        None => ConsentStatus::Undecided,
        Some(decision) => {
            let age = now.signed_duration_since(decision.decided_at);
            if age > Duration::days(CONSENT_VALIDITY_DAYS) {
                ConsentStatus::Undecided
            } else if decision.granted {
                ConsentStatus::Granted
            } else {
                ConsentStatus::Revoked
            }
        }
    }
}

/// The two-stage tracking gate.
///
/// The remote kill-switch overrides local consent: when it is off, nothing
/// tracks regardless of what the user agreed to. Only an unexpired grant
/// passes the second stage.
pub fn should_track(remote_enabled: bool, consent: ConsentStatus) -> bool {
    remote_enabled && consent == ConsentStatus::Granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }

    #[rstest]
    fn no_decision_reads_as_undecided() {
        assert_eq!(consent_status(None, Utc::now()), ConsentStatus::Undecided);
    }

    #[rstest]
    #[case(true, ConsentStatus::Granted)]
    #[case(false, ConsentStatus::Revoked)]
    fn fresh_decisions_are_effective(#[case] granted: bool, #[case] expected: ConsentStatus) {
        let decision = ConsentDecision {
            granted,
            decided_at: days_ago(10),
        };
        assert_eq!(consent_status(Some(&decision), Utc::now()), expected);
    }

    #[rstest]
    fn decisions_older_than_a_year_expire() {
        let decision = ConsentDecision::granted(days_ago(CONSENT_VALIDITY_DAYS + 1));
        assert_eq!(
            consent_status(Some(&decision), Utc::now()),
            ConsentStatus::Undecided
        );
    }

    #[rstest]
    fn decisions_exactly_at_the_boundary_still_hold() {
        let now = Utc::now();
        let decision = ConsentDecision::granted(now - Duration::days(CONSENT_VALIDITY_DAYS));
        assert_eq!(consent_status(Some(&decision), now), ConsentStatus::Granted);
    }

    #[rstest]
    #[case(false, ConsentStatus::Granted, false)]
    #[case(false, ConsentStatus::Undecided, false)]
    #[case(true, ConsentStatus::Revoked, false)]
    #[case(true, ConsentStatus::Undecided, false)]
    #[case(true, ConsentStatus::Granted, true)]
    fn kill_switch_overrides_consent(
        #[case] remote: bool,
        #[case] consent: ConsentStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(should_track(remote, consent), expected);
    }
}
