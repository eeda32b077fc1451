//! Admin bearer-credential checks.
//!
//! Admin endpoints authenticate against a static credential configured at
//! process start. The extractor runs before any handler body, so a missing
//! or mismatched credential never reaches a port. Key material is held
//! zeroized; logs and audit rows only ever see a hash fingerprint.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::{Ready, ready};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::Error;
use crate::inbound::http::state::HttpState;

/// Hex length of the fingerprint surfaced in logs and audit metadata.
const FINGERPRINT_LEN: usize = 12;

fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

fn fingerprint(secret: &str) -> String {
    let mut hex = hex::encode(digest(secret));
    hex.truncate(FINGERPRINT_LEN);
    hex
}

struct AdminKey {
    // Retained so the key survives in memory only in zeroized form.
    _secret: Zeroizing<String>,
    digest: [u8; 32],
    fingerprint: String,
}

impl AdminKey {
    fn new(secret: String) -> Self {
        let digest = digest(&secret);
        let fingerprint = fingerprint(&secret);
        Self {
            _secret: Zeroizing::new(secret),
            digest,
            fingerprint,
        }
    }
}

/// The configured admin credential set: one primary key plus an optional
/// legacy key accepted during rotation.
pub struct AdminCredentials {
    keys: Vec<AdminKey>,
}

impl AdminCredentials {
    pub fn new(primary: String, legacy: Option<String>) -> Self {
        let mut keys = vec![AdminKey::new(primary)];
        if let Some(legacy) = legacy {
            keys.push(AdminKey::new(legacy));
        }
        Self { keys }
    }

    /// Check a presented token, returning the matching key's fingerprint.
    ///
    /// Comparison happens on SHA-256 digests so token length never shapes
    /// the comparison.
    pub fn authenticate(&self, presented: &str) -> Option<&str> {
        let presented = digest(presented);
        self.keys
            .iter()
            .find(|key| key.digest == presented)
            .map(|key| key.fingerprint.as_str())
    }
}

/// Proof of an authenticated admin request.
///
/// Obtained via `FromRequest`; handlers taking this extractor cannot run
/// without a valid credential.
#[derive(Debug, Clone)]
pub struct AdminSession {
    fingerprint: String,
}

impl AdminSession {
    /// Fingerprint of the credential used, for audit metadata.
    pub fn actor(&self) -> &str {
        &self.fingerprint
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn admin_session(req: &HttpRequest) -> Result<AdminSession, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("admin credentials not configured"))?;
    let token =
        bearer_token(req).ok_or_else(|| Error::unauthorized("admin credentials required"))?;
    let fingerprint = state
        .admin
        .authenticate(token)
        .ok_or_else(|| Error::unauthorized("admin credentials required"))?;
    Ok(AdminSession {
        fingerprint: fingerprint.to_owned(),
    })
}

impl FromRequest for AdminSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(admin_session(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn credentials() -> AdminCredentials {
        AdminCredentials::new("primary-key".to_owned(), Some("legacy-key".to_owned()))
    }

    #[rstest]
    fn accepts_primary_and_legacy_keys() {
        let creds = credentials();
        assert!(creds.authenticate("primary-key").is_some());
        assert!(creds.authenticate("legacy-key").is_some());
    }

    #[rstest]
    #[case("")]
    #[case("primary-key ")]
    #[case("wrong")]
    fn rejects_mismatched_tokens(#[case] token: &str) {
        assert!(credentials().authenticate(token).is_none());
    }

    #[rstest]
    fn fingerprint_is_stable_and_short() {
        let creds = credentials();
        let first = creds.authenticate("primary-key").map(str::to_owned);
        let second = creds.authenticate("primary-key").map(str::to_owned);
        assert_eq!(first, second);
        assert_eq!(first.map(|f| f.len()), Some(FINGERPRINT_LEN));
    }

    #[rstest]
    fn fingerprint_never_contains_the_secret() {
        let creds = AdminCredentials::new("hunter2".to_owned(), None);
        let fp = creds.authenticate("hunter2").expect("match").to_owned();
        assert!(!fp.contains("hunter2"));
    }
}
