//! Domain models, services, and ports.
//!
//! Everything here is transport and storage agnostic: strongly typed
//! entities with documented invariants, use-case services operating through
//! port traits, and the error taxonomy adapters map at their edges.

pub mod analytics;
pub mod error;
pub mod events;
pub mod payment;
pub mod ports;
pub mod settings;
pub mod trial;
pub mod visitor;

pub use self::error::{Error, ErrorCode};
