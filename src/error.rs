// Error types for repo-insights.
// Handles GitHub API errors, cache errors, and general application errors.

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{0}")]
    Other(String),
}

impl InsightsError {
    /// Whether this error is the remote asking us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, InsightsError::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_is_distinguishable() {
        let err = InsightsError::RateLimited {
            reset_at: "12:00:00".to_string(),
        };
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("12:00:00"));

        assert!(!InsightsError::Unauthorized.is_rate_limited());
        assert!(!InsightsError::Other("boom".into()).is_rate_limited());
    }
}
