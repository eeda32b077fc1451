//! HMAC-SHA256 payment signature verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with the shared API
//! secret and sends the hex digest back through the client. Verification
//! recomputes the MAC and compares in constant time; a malformed hex
//! signature is a plain mismatch, not an error.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::Error;
use crate::domain::payment::PaymentVerification;
use crate::domain::ports::SignatureVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Verifier holding the gateway's shared signing secret.
pub struct HmacSignatureVerifier {
    secret: Zeroizing<String>,
}

impl HmacSignatureVerifier {
    pub fn new(secret: String) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    fn mac_for(&self, verification: &PaymentVerification) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(verification.gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(verification.gateway_payment_id.as_bytes());
        mac
    }
}

#[async_trait]
impl SignatureVerifier for HmacSignatureVerifier {
    async fn verify(&self, verification: &PaymentVerification) -> Result<bool, Error> {
        let Ok(presented) = hex::decode(&verification.signature) else {
            return Ok(false);
        };
        Ok(self.mac_for(verification).verify_slice(&presented).is_ok())
    }
}
