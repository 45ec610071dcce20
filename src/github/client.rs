// GitHub API HTTP client.
// Handles authentication, rate limiting, and request/response processing.

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::error::{InsightsError, Result};

use super::types::RateLimit;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Environment variables checked for a token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_PAT", "GITHUB_TOKEN"];

/// GitHub API client with optional authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client, authenticated when a token is given.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| InsightsError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-insights"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(InsightsError::Api)?;

        Ok(Self {
            client,
            rate_limit: RateLimit::default(),
        })
    }

    /// Create a client from GITHUB_PAT or GITHUB_TOKEN.
    ///
    /// Falls back to unauthenticated access, which has a much lower
    /// search rate limit.
    pub fn from_env() -> Result<Self> {
        let token = TOKEN_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
        if token.is_none() {
            debug!("No GitHub token in environment, using unauthenticated requests");
        }
        Self::new(token.as_deref())
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", GITHUB_API_BASE, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(InsightsError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        let headers = response.headers();
        if let Some(limit) = header_u64(headers, "x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header_u64(headers, "x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
        }
        if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &headers, &body, &url, self.rate_limit.reset))
    }
}

/// Map a non-success response to an error, separating throttling from
/// real failures.
///
/// `reset` is the last seen `x-ratelimit-reset` epoch, used to report when
/// the primary limit lifts.
fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    url: &str,
    reset: u64,
) -> InsightsError {
    match status {
        StatusCode::UNAUTHORIZED => InsightsError::Unauthorized,
        StatusCode::NOT_FOUND => InsightsError::NotFound(url.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let exhausted = header_u64(headers, "x-ratelimit-remaining") == Some(0);
            let retry_after = header_u64(headers, "retry-after");

            // Secondary rate limits come back as a plain 403 with a message.
            if status == StatusCode::TOO_MANY_REQUESTS
                || exhausted
                || retry_after.is_some()
                || is_rate_limit_message(body)
            {
                InsightsError::RateLimited {
                    reset_at: describe_reset(retry_after, reset),
                }
            } else {
                InsightsError::Other(format!("Forbidden: {}", body))
            }
        }
        status => InsightsError::Other(format!("HTTP {}: {}", status, body)),
    }
}

fn describe_reset(retry_after: Option<u64>, reset: u64) -> String {
    if let Some(secs) = retry_after {
        return format!("+{}s", secs);
    }
    chrono::DateTime::from_timestamp(reset as i64, 0)
        .filter(|_| reset > 0)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn is_rate_limit_message(body: &str) -> bool {
    body.to_ascii_lowercase().contains("rate limit")
}

/// Extract the `page` parameter of the `rel="next"` entry in a Link header.
pub fn next_page_from_link(link: &str) -> Option<u32> {
    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let url = segments.next()?.trim();
        let is_next = segments.any(|param| param.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }

        let url = url.strip_prefix('<')?.strip_suffix('>')?;
        let (_, query) = url.split_once('?')?;
        query.split('&').find_map(|pair| match pair.split_once('=') {
            Some(("page", value)) => value.parse().ok(),
            _ => None,
        })
    })
}
