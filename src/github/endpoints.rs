// GitHub API endpoint functions.
// Provides typed methods for the issue search endpoint.

use async_trait::async_trait;
use reqwest::header::LINK;
use tracing::debug;

use crate::error::Result;
use crate::fetch::SearchBackend;

use super::client::{GitHubClient, next_page_from_link};
use super::types::{Issue, SearchPage, SearchRequest, SearchResponse};

impl GitHubClient {
    /// Search issues and pull requests, returning one page of results.
    pub async fn search_issues(&mut self, request: &SearchRequest<'_>) -> Result<SearchPage<Issue>> {
        let params = [
            ("q", request.query),
            ("sort", request.sort),
            ("order", request.order),
            ("page", &request.page.to_string()),
            ("per_page", &request.per_page.to_string()),
        ];
        let response = self.get_with_params("/search/issues", &params).await?;
        debug!(
            page = request.page,
            remaining = self.rate_limit().remaining,
            limit = self.rate_limit().limit,
            "Search quota"
        );

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);

        let body: SearchResponse<Issue> = response.json().await?;
        Ok(SearchPage {
            items: body.items,
            total_count: body.total_count,
            next_page,
        })
    }
}

#[async_trait]
impl SearchBackend for GitHubClient {
    async fn search_page(&mut self, request: &SearchRequest<'_>) -> Result<SearchPage<Issue>> {
        self.search_issues(request).await
    }
}
