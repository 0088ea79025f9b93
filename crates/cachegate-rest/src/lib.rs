//! # Cachegate REST
//!
//! Thin Axum boundary over the cache accessor.
//! Maps HTTP routes onto accessor operations and renders cached responses
//! back to the caller.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
