//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppConfig, GatewaySettings};

use state_builders::{GatewaySeam, build_http_state};

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{PaymentGateway, SignatureVerifier};
use crate::inbound::http::admin_analytics::admin_analytics;
use crate::inbound::http::admin_orders::admin_orders;
use crate::inbound::http::admin_settings::{get_settings, update_settings};
use crate::inbound::http::admin_visitors::{admin_visitors, export_visitors};
use crate::inbound::http::auth::AdminCredentials;
use crate::inbound::http::checkout::{create_order, verify_payment};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tracking::{erase_visitor, record_visitor, track_event, tracking_status};
use crate::inbound::http::trials::{check_free_trial, claim_free_trial};
use crate::outbound::persistence::DbPool;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Runtime configuration assembled in `main` and consumed by
/// [`create_server`].
pub struct ServerConfig {
    bind_addr: SocketAddr,
    db_pool: DbPool,
    admin: AdminCredentials,
    gateway: GatewaySeam,
}

impl ServerConfig {
    /// Construct a configuration with the checkout seam unconfigured;
    /// checkout endpoints answer 503 until a gateway is attached.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool, admin: AdminCredentials) -> Self {
        Self {
            bind_addr,
            db_pool,
            admin,
            gateway: GatewaySeam::unconfigured(),
        }
    }

    /// Attach the payment gateway and its signature verifier.
    #[must_use]
    pub fn with_gateway(
        mut self,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        self.gateway = GatewaySeam { gateway, verifier };
        self
    }
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(tracking_status)
        .service(record_visitor)
        .service(erase_visitor)
        .service(track_event)
        .service(check_free_trial)
        .service(claim_free_trial)
        .service(create_order)
        .service(verify_payment)
        .service(admin_analytics)
        .service(admin_orders)
        .service(admin_visitors)
        .service(export_visitors)
        .service(get_settings)
        .service(update_settings);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from the supplied configuration.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        db_pool,
        admin,
        gateway,
    } = config;
    let http_state = web::Data::new(build_http_state(&db_pool, admin, gateway));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
