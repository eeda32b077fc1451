//! Backend for the Pawtrait marketing site: visitor tracking ingestion,
//! the tracking kill-switch, checkout order records, and the admin
//! reporting surface.
//!
//! The crate follows a ports-and-adapters layout: `domain` holds models,
//! services, and port traits; `inbound::http` maps HTTP requests onto the
//! ports; `outbound::persistence` implements the ports against PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::trace::Trace;
