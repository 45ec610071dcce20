// Cache error types.
// Every variant except Encode is a cache miss from the fetcher's point of view.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("no cache entry at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("cache entry {} expired at {expired_at}", .path.display())]
    Expired {
        path: PathBuf,
        expired_at: DateTime<Utc>,
    },

    #[error("failed to decode cache entry {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cache IO error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl CacheError {
    /// Plain absence of an entry, as opposed to a stale or broken one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
