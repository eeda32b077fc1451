//! Visitor identity and consent management over a state store.
//!
//! The manager reads or generates a durable UUID v4 visitor identifier
//! (128 bits, 122 random) and records consent decisions. When the backing
//! store fails it degrades to session-only identity: a fresh identifier
//! per process, with `durable: false` surfaced to callers so the loss of
//! durability is explicit rather than silently corrupted ids.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::consent::{ConsentDecision, ConsentStatus, consent_status};
use crate::store::{StateStore, StoredState};

/// A visitor identifier plus whether it survives process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: Uuid,
    /// False when the store is unavailable and the id is session-only.
    pub durable: bool,
}

/// Identity and consent manager over a [`StateStore`].
pub struct IdentityManager<S: StateStore> {
    store: S,
    state: StoredState,
    durable: bool,
}

impl<S: StateStore> IdentityManager<S> {
    /// Open the manager, loading any stored state.
    ///
    /// A failed load degrades to session-only state rather than erroring:
    /// identity must keep working with storage disabled.
    pub fn open(store: S) -> Self {
        let (state, durable) = match store.load() {
            Ok(state) => (state.unwrap_or_default(), true),
            Err(err) => {
                warn!(error = %err, "state store unavailable; using session-only identity");
                (StoredState::default(), false)
            }
        };
        Self {
            store,
            state,
            durable,
        }
    }

    fn persist(&mut self) {
        if !self.durable {
            return;
        }
        if let Err(err) = self.store.save(&self.state) {
            warn!(error = %err, "state store write failed; degrading to session-only identity");
            self.durable = false;
        }
    }

    /// Read or generate the visitor identifier.
    ///
    /// Idempotent per store: repeated calls return the same identifier for
    /// as long as the backing state survives.
    pub fn visitor_identity(&mut self) -> VisitorIdentity {
        if let Some(visitor_id) = self.state.visitor_id {
            return VisitorIdentity {
                visitor_id,
                durable: self.durable,
            };
        }
        let visitor_id = Uuid::new_v4();
        self.state.visitor_id = Some(visitor_id);
        self.persist();
        VisitorIdentity {
            visitor_id,
            durable: self.durable,
        }
    }

    /// Record that the user allowed tracking.
    pub fn grant_consent(&mut self, now: DateTime<Utc>) {
        self.state.consent = Some(ConsentDecision::granted(now));
        self.persist();
    }

    /// Record that the user refused or withdrew tracking.
    pub fn revoke_consent(&mut self, now: DateTime<Utc>) {
        self.state.consent = Some(ConsentDecision::revoked(now));
        self.persist();
    }

    /// Effective consent state at `now`; decisions older than a year read
    /// back as undecided.
    pub fn consent(&self, now: DateTime<Utc>) -> ConsentStatus {
        consent_status(self.state.consent.as_ref(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore, StoreError};
    use chrono::Duration;
    use rstest::rstest;

    /// Store double whose reads and writes always fail.
    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self) -> Result<Option<StoredState>, StoreError> {
            Err(StoreError::Read("disabled".to_owned()))
        }

        fn save(&mut self, _state: &StoredState) -> Result<(), StoreError> {
            Err(StoreError::Write("disabled".to_owned()))
        }
    }

    #[rstest]
    fn identity_is_idempotent_within_one_store() {
        let mut manager = IdentityManager::open(MemoryStore::default());
        let first = manager.visitor_identity();
        let second = manager.visitor_identity();
        assert_eq!(first, second);
        assert!(first.durable);
    }

    #[rstest]
    fn identity_survives_reopening_a_file_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");

        let first = IdentityManager::open(FileStore::new(&path)).visitor_identity();
        let second = IdentityManager::open(FileStore::new(&path)).visitor_identity();
        assert_eq!(first.visitor_id, second.visitor_id);
    }

    #[rstest]
    fn broken_store_degrades_to_session_only_identity() {
        let mut manager = IdentityManager::open(BrokenStore);
        let identity = manager.visitor_identity();
        assert!(!identity.durable);
        // Identity still works within the session.
        assert_eq!(manager.visitor_identity().visitor_id, identity.visitor_id);
    }

    #[rstest]
    fn two_broken_sessions_get_distinct_identifiers() {
        let first = IdentityManager::open(BrokenStore).visitor_identity();
        let second = IdentityManager::open(BrokenStore).visitor_identity();
        assert_ne!(first.visitor_id, second.visitor_id);
    }

    #[rstest]
    fn consent_round_trips_through_the_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("state.json");
        let now = Utc::now();

        let mut manager = IdentityManager::open(FileStore::new(&path));
        manager.grant_consent(now);

        let reopened = IdentityManager::open(FileStore::new(&path));
        assert_eq!(reopened.consent(now), ConsentStatus::Granted);
    }

    #[rstest]
    fn revocation_replaces_a_grant() {
        let now = Utc::now();
        let mut manager = IdentityManager::open(MemoryStore::default());
        manager.grant_consent(now);
        manager.revoke_consent(now);
        assert_eq!(manager.consent(now), ConsentStatus::Revoked);
    }

    #[rstest]
    fn stale_consent_reads_back_as_undecided() {
        let decided = Utc::now() - Duration::days(400);
        let mut manager = IdentityManager::open(MemoryStore::default());
        manager.grant_consent(decided);
        assert_eq!(manager.consent(Utc::now()), ConsentStatus::Undecided);
    }
}
