//! Backend entry-point: configuration, migrations, pool, and server wiring.

use std::io;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::auth::AdminCredentials;
use backend::inbound::http::health::HealthState;
use backend::outbound::gateway::{HmacSignatureVerifier, HttpPaymentGateway};
use backend::outbound::persistence::{DbPool, run_pending_migrations};
use backend::server::{AppConfig, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load()
        .map_err(|err| io::Error::other(format!("configuration failed: {err}")))?;
    let bind_addr = config
        .socket_addr()
        .map_err(|err| io::Error::other(format!("invalid bind address: {err}")))?;

    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| io::Error::other("PAWTRAIT_DATABASE_URL is required"))?;
    run_pending_migrations(&database_url)
        .map_err(|err| io::Error::other(format!("migrations failed: {err}")))?;
    let pool = DbPool::connect(&database_url, config.db_max_connections)
        .await
        .map_err(|err| io::Error::other(format!("database pool failed: {err}")))?;

    let admin = match config.admin_credentials() {
        Some(credentials) => credentials,
        None if cfg!(debug_assertions) => {
            warn!("no admin key configured; using an ephemeral key (dev only)");
            AdminCredentials::new(uuid::Uuid::new_v4().to_string(), None)
        }
        None => return Err(io::Error::other("PAWTRAIT_ADMIN_API_KEY is required")),
    };

    let mut server_config = ServerConfig::new(bind_addr, pool, admin);
    match config
        .gateway_settings()
        .map_err(|err| io::Error::other(format!("invalid gateway endpoint: {err}")))?
    {
        Some(settings) => {
            let verifier = HmacSignatureVerifier::new(settings.key_secret.clone());
            let gateway =
                HttpPaymentGateway::new(settings.endpoint, settings.key_id, settings.key_secret)
                    .map_err(|err| io::Error::other(format!("gateway setup failed: {err}")))?;
            server_config = server_config.with_gateway(Arc::new(gateway), Arc::new(verifier));
        }
        None => warn!("payment gateway not configured; checkout endpoints will answer 503"),
    }

    let health_state = web::Data::new(HealthState::default());
    info!(%bind_addr, "starting server");
    let server = create_server(health_state, server_config)?;
    server.await
}
