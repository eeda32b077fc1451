//! Reqwest-backed payment gateway adapter.
//!
//! Owns transport details only: request serialisation, authentication,
//! timeout, and HTTP error mapping. Gateway failures surface as
//! `service_unavailable` because order creation is a blocking critical
//! path, never soft-failed telemetry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};
use zeroize::Zeroizing;

use crate::domain::Error;
use crate::domain::ports::PaymentGateway;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the gateway's orders API.
pub struct HttpPaymentGatewayConfig {
    /// Base URL of the gateway REST API, e.g. `https://api.razorpay.com/v1/`.
    pub endpoint: Url,
    /// API key id presented as the basic-auth username.
    pub key_id: String,
    /// API key secret presented as the basic-auth password.
    pub key_secret: String,
    /// Per-request timeout. Defaults to 15 seconds when built via
    /// [`HttpPaymentGateway::new`].
    pub timeout: Duration,
}

/// Payment gateway adapter performing HTTP POSTs against the orders API.
pub struct HttpPaymentGateway {
    client: Client,
    orders_url: Url,
    key_id: String,
    key_secret: Zeroizing<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayOrderDto {
    id: String,
}

impl HttpPaymentGateway {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the orders URL cannot be derived from the
    /// endpoint or the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, key_id: String, key_secret: String) -> Result<Self, Error> {
        Self::with_config(HttpPaymentGatewayConfig {
            endpoint,
            key_id,
            key_secret,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Build an adapter from explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the orders URL cannot be derived from the
    /// endpoint or the reqwest client cannot be constructed.
    pub fn with_config(config: HttpPaymentGatewayConfig) -> Result<Self, Error> {
        let orders_url = config
            .endpoint
            .join("orders")
            .map_err(|err| Error::internal(format!("invalid gateway endpoint: {err}")))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| Error::internal(format!("gateway client construction failed: {err}")))?;
        Ok(Self {
            client,
            orders_url,
            key_id: config.key_id,
            key_secret: Zeroizing::new(config.key_secret),
        })
    }
}

fn map_status_error(status: StatusCode) -> Error {
    error!(%status, "payment gateway rejected order creation");
    Error::service_unavailable("payment gateway rejected the order")
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: i64,
    ) -> Result<String, Error> {
        let body = json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": format!("order_rcpt_{receipt}"),
        });

        let response = self
            .client
            .post(self.orders_url.clone())
            .basic_auth(&self.key_id, Some(self.key_secret.as_str()))
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "payment gateway unreachable");
                Error::service_unavailable("payment gateway unreachable")
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(status));
        }

        let order: GatewayOrderDto = response.json().await.map_err(|err| {
            error!(error = %err, "payment gateway returned an undecodable order");
            Error::service_unavailable("payment gateway returned an invalid response")
        })?;
        Ok(order.id)
    }
}
