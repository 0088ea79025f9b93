//! Query and header extraction.

mod cache_query;
mod forwarded;
mod pagination;

pub use cache_query::*;
pub use forwarded::*;
pub use pagination::*;
