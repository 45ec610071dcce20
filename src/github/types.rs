// GitHub API response types.
// Defines structs for search requests and deserializing search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issue or pull request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// GitHub user (issue author).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Issue label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Option<u64>,
    pub name: String,
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pull request links attached to an issue search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestLinks {
    pub html_url: Option<String>,
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Issue or pull request returned by the search API.
///
/// Fields the tool does not interpret are kept in `extra`, here and on the
/// nested types, so cached entries carry the full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub state: IssueState,
    pub html_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub user: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub pull_request: Option<PullRequestLinks>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// One page request against the issue search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub sort: &'static str,
    pub order: &'static str,
    pub page: u32,
    pub per_page: u32,
}

/// Body of a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

/// One page of search results plus the pointer to the next page.
#[derive(Debug, Clone)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    /// Page number of the next page, `None` on the last page.
    pub next_page: Option<u32>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

#[cfg(test)]
pub(crate) fn test_issue(number: u64, title: &str, created_at: DateTime<Utc>) -> Issue {
    Issue {
        id: 1000 + number,
        number,
        title: title.to_string(),
        state: IssueState::Closed,
        html_url: Some(format!("https://github.com/o/r/pull/{}", number)),
        created_at,
        closed_at: None,
        user: None,
        labels: Vec::new(),
        pull_request: None,
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "total_count": 1,
        "incomplete_results": false,
        "items": [{
            "id": 2296000001,
            "number": 7001,
            "title": "fix: handle empty module",
            "state": "closed",
            "html_url": "https://github.com/dagger/dagger/pull/7001",
            "created_at": "2024-04-02T10:15:30Z",
            "closed_at": "2024-04-03T08:00:00Z",
            "user": {"id": 42, "login": "octocat", "type": "User"},
            "labels": [{"id": 7, "name": "kind/bug", "color": "d73a4a", "default": false}],
            "pull_request": {
                "url": "https://api.github.com/repos/dagger/dagger/pulls/7001",
                "html_url": "https://github.com/dagger/dagger/pull/7001",
                "merged_at": "2024-04-03T08:00:00Z"
            },
            "comments": 3,
            "score": 1.0
        }]
    }"#;

    #[test]
    fn test_deserialize_search_response() {
        let response: SearchResponse<Issue> = serde_json::from_str(SEARCH_BODY).unwrap();
        assert_eq!(response.total_count, 1);
        assert!(!response.incomplete_results);

        let issue = &response.items[0];
        assert_eq!(issue.number, 7001);
        assert_eq!(issue.state, IssueState::Closed);
        assert!(issue.is_pull_request());
        assert_eq!(issue.user.as_ref().unwrap().login, "octocat");
        assert_eq!(issue.labels[0].name, "kind/bug");
        assert_eq!(issue.extra.get("comments"), Some(&Value::from(3)));
    }

    #[test]
    fn test_issue_keeps_unknown_fields_through_serialization() {
        let response: SearchResponse<Issue> = serde_json::from_str(SEARCH_BODY).unwrap();
        let issue = response.items.into_iter().next().unwrap();

        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();

        assert_eq!(back, issue);
        assert!(back.extra.contains_key("score"));

        let links = back.pull_request.as_ref().unwrap();
        assert_eq!(
            links.extra.get("url"),
            Some(&Value::from("https://api.github.com/repos/dagger/dagger/pulls/7001"))
        );
        assert_eq!(back.labels[0].extra.get("default"), Some(&Value::from(false)));
        assert!(back.user.as_ref().unwrap().extra.is_empty());
    }

    #[test]
    fn test_unknown_state() {
        let issue: Issue = serde_json::from_str(
            r#"{"id": 1, "number": 1, "title": "t", "state": "locked",
                "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(issue.state, IssueState::Unknown);
        assert!(!issue.is_pull_request());
    }
}
