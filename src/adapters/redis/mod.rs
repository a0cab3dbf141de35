//! Redis adapters.

mod session_cache;

pub use session_cache::RedisSessionCache;
