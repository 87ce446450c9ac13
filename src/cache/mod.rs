//! Generic in-memory caching layer.
//!
//! This module is API-agnostic:
//! - Entries carry their own TTL and expire lazily on read
//! - Concurrent misses on one key share a single in-flight fetch
//! - Failed fetches are never cached

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use traits::QueryKey;
