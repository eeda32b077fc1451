//! Application configuration loaded via OrthoConfig.
//!
//! Every knob is read once at process start and carried into handlers
//! through server state; nothing below this layer touches ambient
//! environment variables.

use std::net::{AddrParseError, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::inbound::http::auth::AdminCredentials;

/// Parsed payment gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub endpoint: Url,
    pub key_id: String,
    pub key_secret: String,
}

/// Configuration values for the backend service.
///
/// Environment variables use the `PAWTRAIT_` prefix, e.g.
/// `PAWTRAIT_DATABASE_URL`. The legacy admin key slot exists for
/// deployments still holding the historical second secret; every admin
/// endpoint accepts either configured value.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PAWTRAIT")]
pub struct AppConfig {
    /// Socket address the HTTP server binds.
    #[ortho_config(default = "0.0.0.0:8080".to_string())]
    pub bind_addr: String,
    /// PostgreSQL connection URL. Required to start the server.
    pub database_url: Option<String>,
    /// Maximum connections held by the async pool.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Primary admin bearer key.
    pub admin_api_key: Option<String>,
    /// Optional second admin key accepted during rotation.
    pub admin_legacy_key: Option<String>,
    /// Base URL of the payment gateway REST API.
    pub gateway_endpoint: Option<String>,
    /// Gateway API key id.
    pub gateway_key_id: Option<String>,
    /// Gateway API key secret; also signs payment verifications.
    pub gateway_key_secret: Option<String>,
}

impl AppConfig {
    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns the parse failure when the configured value is not a valid
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.parse()
    }

    /// Assemble the admin credential set, `None` when no primary key is
    /// configured.
    pub fn admin_credentials(&self) -> Option<AdminCredentials> {
        self.admin_api_key.clone().map(|primary| {
            AdminCredentials::new(primary, self.admin_legacy_key.clone())
        })
    }

    /// Assemble the gateway settings when the endpoint and both key halves
    /// are configured.
    ///
    /// # Errors
    ///
    /// Returns the parse failure when the configured endpoint is not a
    /// valid URL.
    pub fn gateway_settings(&self) -> Result<Option<GatewaySettings>, url::ParseError> {
        let (Some(endpoint), Some(key_id), Some(key_secret)) = (
            self.gateway_endpoint.as_deref(),
            self.gateway_key_id.clone(),
            self.gateway_key_secret.clone(),
        ) else {
            return Ok(None);
        };
        Ok(Some(GatewaySettings {
            endpoint: Url::parse(endpoint)?,
            key_id,
            key_secret,
        }))
    }
}
