//! # Cachegate Resilience
//!
//! Resilience primitives for Cachegate.
//! Provides bounded waits for upstream work and per-key mutual exclusion
//! around the cache miss path.

pub mod keyed_lock;
pub mod timeout;

pub use keyed_lock::*;
pub use timeout::*;
