//! Request middleware.
//!
//! Middleware components for request lifecycle concerns such as trace
//! correlation. Handlers stay free of framework plumbing; anything that has
//! to run around every request lives here.

pub mod trace;
