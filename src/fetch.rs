// Paginated, rate-limit aware search with read-through/write-through caching.
// Walks every result page sequentially and retries throttled pages in place.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::cache::{CacheLookup, QueryCache};
use crate::error::{InsightsError, Result};
use crate::github::{Issue, SearchPage, SearchRequest};

/// Results requested per page (the search API maximum).
pub const PER_PAGE: u32 = 100;

/// Wait applied after each rate-limit response.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Field the search API sorts on.
const SORT_FIELD: &str = "created";

/// Oldest first; downstream bucketing relies on it.
const SORT_ORDER: &str = "asc";

/// Remote search collaborator.
///
/// Implementations return `InsightsError::RateLimited` when throttled so the
/// fetcher can tell it apart from real failures.
#[async_trait]
pub trait SearchBackend: Send {
    async fn search_page(&mut self, request: &SearchRequest<'_>) -> Result<SearchPage<Issue>>;
}

/// How throttled page requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait before retrying the same page.
    pub cooldown: Duration,
    /// Retries allowed per page; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(cooldown: Duration) -> Self {
        Self {
            cooldown,
            max_attempts: None,
        }
    }

    /// No wait between retries.
    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before retry number `attempt` (1-based), or `None` once retries
    /// are exhausted.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt > max => None,
            _ => Some(self.cooldown),
        }
    }
}

/// Searches one repository, optionally through a [`QueryCache`].
pub struct Fetcher<'c, B> {
    backend: B,
    cache: Option<&'c QueryCache>,
    repo: String,
    retry: RetryPolicy,
}

impl<'c, B: SearchBackend> Fetcher<'c, B> {
    pub fn new(backend: B, repo: impl Into<String>) -> Self {
        Self {
            backend,
            cache: None,
            repo: repo.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: &'c QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The composed search string, which doubles as the cache key.
    pub fn full_query(&self, query: &str, since: NaiveDate) -> String {
        format!(
            "repo:{} created:>{} {}",
            self.repo,
            since.format("%Y-%m-%d"),
            query
        )
    }

    /// Return every issue matching `query` created after `since`, oldest first.
    ///
    /// Cache failures never abort the search. Remote failures other than rate
    /// limiting abort it and discard any pages fetched so far.
    pub async fn search(&mut self, query: &str, since: NaiveDate) -> Result<Vec<Issue>> {
        let full_query = self.full_query(query, since);

        if let Some(cache) = self.cache {
            match cache.lookup::<Issue>(&full_query) {
                CacheLookup::Hit(issues) => {
                    info!(query = %full_query, issues = issues.len(), "Using cached results");
                    return Ok(issues);
                }
                CacheLookup::Miss(reason) if reason.is_not_found() => {
                    debug!(query = %full_query, "Cache miss");
                }
                CacheLookup::Miss(reason) => {
                    warn!(query = %full_query, error = %reason, "Error loading cache");
                }
            }
        }

        let issues = self.fetch_all(&full_query).await?;

        if let Some(cache) = self.cache {
            if let Err(e) = cache.save(&full_query, &issues) {
                warn!(query = %full_query, error = %e, "Error saving cache");
            }
        }

        Ok(issues)
    }

    async fn fetch_all(&mut self, full_query: &str) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut page = 1;

        loop {
            let result = self.fetch_page(full_query, page).await?;
            issues.extend(result.items);
            debug!(
                page,
                total_count = result.total_count,
                fetched = issues.len(),
                "Fetched search page"
            );

            match result.next_page {
                Some(next) if next > page => page = next,
                Some(next) => {
                    return Err(InsightsError::Other(format!(
                        "Search pagination did not advance: page {} points to page {}",
                        page, next
                    )));
                }
                None => break,
            }
        }

        info!(query = %full_query, issues = issues.len(), "Search complete");
        Ok(issues)
    }

    /// Fetch a single page, sleeping and retrying it while throttled.
    async fn fetch_page(&mut self, full_query: &str, page: u32) -> Result<SearchPage<Issue>> {
        let request = SearchRequest {
            query: full_query,
            sort: SORT_FIELD,
            order: SORT_ORDER,
            page,
            per_page: PER_PAGE,
        };

        let mut attempt = 0;
        loop {
            match self.backend.search_page(&request).await {
                Err(e) if e.is_rate_limited() => {
                    attempt += 1;
                    let Some(delay) = self.retry.backoff(attempt) else {
                        warn!(page, attempts = attempt, "Rate limited, giving up");
                        return Err(e);
                    };
                    warn!(page, error = %e, wait = ?delay, "Rate limited, waiting before retry");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
