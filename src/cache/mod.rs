// Cache module for local filesystem caching.
// Stores search results per query so repeated runs skip the GitHub API.

pub mod error;
pub mod paths;
pub mod store;

pub use error::CacheError;
pub use paths::{default_cache_dir, entry_path, query_digest};
pub use store::{CacheEntry, CacheLookup, DEFAULT_TTL, QueryCache};
