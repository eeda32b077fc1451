//! Outbound adapters implementing domain ports for external
//! infrastructure.

pub mod gateway;
pub mod persistence;
