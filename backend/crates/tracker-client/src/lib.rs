//! Client-side tracking library for the Pawtrait backend.
//!
//! Mirrors the browser tracking layer as a reusable Rust client: a durable
//! visitor identity with consent management (`identity`, `consent`,
//! `store`) and a fire-and-forget event tracker gated by the remote
//! kill-switch (`client`).
//!
//! The gate order is fixed: the backend's `/tracking-status` switch is
//! consulted before local consent, and an unconfirmed switch suppresses
//! everything, including the consent prompt itself.

pub mod client;
pub mod consent;
pub mod identity;
pub mod store;

pub use client::{SoftResult, TrackerClient, TrackerError, TrackingStatus};
pub use consent::{CONSENT_VALIDITY_DAYS, ConsentDecision, ConsentStatus, should_track};
pub use identity::{IdentityManager, VisitorIdentity};
pub use store::{FileStore, MemoryStore, StateStore, StoredState};
