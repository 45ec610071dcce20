//! Command-line interface parsing for repo-insights
//!
//! Parses arguments with clap and validates them into [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::cache::{DEFAULT_TTL, default_cache_dir};
use crate::error::{InsightsError, Result};
use crate::fetch::RetryPolicy;

pub const DEFAULT_REPO: &str = "dagger/dagger";
pub const DEFAULT_SINCE: &str = "2024-01-01";
pub const DEFAULT_QUERIES: [&str; 2] = ["is:pr is:merged", r#"is:pr "fix" in:title is:merged"#];
pub const DEFAULT_EXCLUDES: [&str; 3] = ["doc", "ci", "chore"];

/// Weekly and monthly issue/PR activity from the GitHub search API
#[derive(Parser, Debug)]
#[command(name = "repo-insights")]
#[command(version)]
pub struct Cli {
    /// Repository to search, as owner/name
    #[arg(long, default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Only count items created after this date (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_SINCE)]
    pub since: String,

    /// Search qualifiers to run; repeat for several queries
    ///
    /// Defaults to merged PRs and merged PRs with "fix" in the title.
    #[arg(long = "query", value_name = "QUERY")]
    pub queries: Vec<String>,

    /// Drop items whose title starts with "<PREFIX>:" or "<PREFIX>s:"
    ///
    /// Defaults to doc, ci and chore.
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub excludes: Vec<String>,

    /// Directory holding cached search results
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Hours before a cached result is refetched
    #[arg(long, default_value_t = DEFAULT_TTL.as_secs() / 3600)]
    pub ttl_hours: u64,

    /// Always query GitHub and do not write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Also print per-week counts
    #[arg(long)]
    pub weekly: bool,

    /// Print every matching title next to its month
    #[arg(long)]
    pub titles: bool,

    /// Seconds to wait after hitting the rate limit
    #[arg(long, default_value_t = 60)]
    pub cooldown_secs: u64,

    /// Give up after this many rate-limited retries of one page
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub repo: String,
    pub since: NaiveDate,
    pub queries: Vec<String>,
    pub excludes: Vec<String>,
    /// `None` when caching is disabled.
    pub cache_dir: Option<PathBuf>,
    pub ttl: Duration,
    pub retry: RetryPolicy,
    pub weekly: bool,
    pub titles: bool,
}

/// Parses a `YYYY-MM-DD` date argument.
pub fn parse_since(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| InsightsError::InvalidDate(s.to_string()))
}

fn validate_repo(repo: &str) -> Result<()> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(InsightsError::Other(format!(
            "Invalid repository '{}', expected owner/name",
            repo
        ))),
    }
}

fn or_defaults(values: &[String], defaults: &[&str]) -> Vec<String> {
    if values.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        values.to_vec()
    }
}

impl Settings {
    /// Validates parsed CLI arguments and fills in defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        validate_repo(&cli.repo)?;
        let since = parse_since(&cli.since)?;

        let cache_dir = if cli.no_cache {
            None
        } else {
            Some(cli.cache_dir.clone().unwrap_or_else(default_cache_dir))
        };

        let mut retry = RetryPolicy::fixed(Duration::from_secs(cli.cooldown_secs));
        if let Some(max) = cli.max_retries {
            retry = retry.with_max_attempts(max);
        }

        Ok(Settings {
            repo: cli.repo.clone(),
            since,
            queries: or_defaults(&cli.queries, &DEFAULT_QUERIES),
            excludes: or_defaults(&cli.excludes, &DEFAULT_EXCLUDES),
            cache_dir,
            ttl: Duration::from_secs(cli.ttl_hours.saturating_mul(3600)),
            retry,
            weekly: cli.weekly,
            titles: cli.titles,
        })
    }
}
