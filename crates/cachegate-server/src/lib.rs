//! # Cachegate Server Library
//!
//! Wires configuration, the connection registry, the upstream fetcher and the
//! cache accessor into the HTTP router, and serves it.

pub mod app;
pub mod startup;

pub use app::*;
