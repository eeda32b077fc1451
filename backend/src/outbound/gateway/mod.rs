//! Payment gateway outbound adapters.
//!
//! Thin transport implementations of the checkout seams: an HTTP client
//! for order creation and an HMAC verifier for payment signatures. The
//! provider's own SDK semantics stay on the other side of the wire.

mod http_gateway;
mod signature;

pub use http_gateway::{HttpPaymentGateway, HttpPaymentGatewayConfig};
pub use signature::HmacSignatureVerifier;
