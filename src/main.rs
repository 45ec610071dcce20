use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use repo_insights::cli::{Cli, Settings};
use repo_insights::insights::{filter_out, render_monthly, render_weekly};
use repo_insights::{Fetcher, GitHubClient, QueryCache, Result};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn run(settings: Settings) -> Result<()> {
    let cache = match &settings.cache_dir {
        Some(dir) => Some(QueryCache::open(dir, settings.ttl)?),
        None => None,
    };

    let client = GitHubClient::from_env()?;
    let mut fetcher = Fetcher::new(client, settings.repo.as_str()).with_retry_policy(settings.retry);
    if let Some(cache) = cache.as_ref() {
        fetcher = fetcher.with_cache(cache);
    }

    let today = Utc::now().date_naive();
    for query in &settings.queries {
        println!("===> Query: {}", query);

        let issues = fetcher.search(query, settings.since).await?;
        let fetched = issues.len();
        let issues = filter_out(issues, &settings.excludes);
        info!(query = %query, fetched, kept = issues.len(), "Filtered results");

        let mut out = io::stdout().lock();
        if settings.weekly {
            render_weekly(&mut out, &issues)?;
        }
        render_monthly(&mut out, settings.since, today, &issues, settings.titles)?;
        out.flush()?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Error searching issues");
            ExitCode::FAILURE
        }
    }
}
