pub mod cache;
pub mod cached_client;
pub mod client;
pub mod search;
pub mod types;

pub use cached_client::{CachedMocoClient, UserFilter};
