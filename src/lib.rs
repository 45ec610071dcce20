//! repo-insights - issue and pull request activity for a GitHub repository
//!
//! Runs GitHub searches through a TTL-bounded on-disk cache, walks every
//! result page while riding out rate limits, and summarizes the results per
//! week and per month.

pub mod cache;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod github;
pub mod insights;

pub use cache::{CacheError, CacheLookup, QueryCache};
pub use error::{InsightsError, Result};
pub use fetch::{Fetcher, RetryPolicy, SearchBackend};
pub use github::{GitHubClient, Issue};
