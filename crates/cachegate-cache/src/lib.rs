//! # Cachegate Cache
//!
//! The cache-aside core of Cachegate.
//!
//! - [`message`]: storable snapshots of HTTP requests and responses
//! - [`store`]: the keyed-store seam with Redis and in-memory backends
//! - [`registry`]: one shared store handle per connection identity
//! - [`fetcher`]: outbound HTTP used on a miss
//! - [`accessor`]: get-or-fetch, key listing, expiration and deletion

pub mod accessor;
pub mod expiration;
pub mod fetcher;
pub mod message;
pub mod registry;
pub mod store;

pub use accessor::{AccessorSettings, CacheAccessor, CacheAccessorImpl};
pub use expiration::KeyExpirationTuple;
pub use fetcher::{Fetcher, ReqwestFetcher, UpstreamResponse};
pub use message::{Headers, HttpMethod, SerializedRequest, SerializedResponse};
pub use registry::{redact_identity, ConnectionRegistry, Connector, DefaultConnector, StoreHandle};
pub use store::{CacheStore, MemoryStore, RedisStore};
