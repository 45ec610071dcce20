// Cache path utilities.
// Maps query strings to content-addressed file names under the cache root.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Extension used for cache entries.
pub const ENTRY_EXTENSION: &str = "json";

/// Extension used for in-flight writes before they are renamed into place.
pub const TEMP_EXTENSION: &str = "tmp";

/// Directory used when no platform cache directory can be determined.
pub const FALLBACK_CACHE_DIR: &str = "cache";

/// Get the platform cache directory (~/.cache/repo-insights on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "repo-insights").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Platform cache directory, or `./cache` when there is no home directory.
pub fn default_cache_dir() -> PathBuf {
    cache_dir().unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
}

/// Lowercase hex SHA-256 of the raw query bytes.
///
/// No normalization happens here: whitespace or clause order changes
/// produce a different digest.
pub fn query_digest(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Path to the cache entry for a query.
pub fn entry_path(root: &Path, query: &str) -> PathBuf {
    root.join(format!("{}.{}", query_digest(query), ENTRY_EXTENSION))
}
