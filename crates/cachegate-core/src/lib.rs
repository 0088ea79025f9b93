//! # Cachegate Core
//!
//! Core types and error definitions for Cachegate.
//! This crate provides the foundational pieces shared by the cache accessor,
//! the configuration layer, and the HTTP boundary.

pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use pagination::*;
pub use result::*;
