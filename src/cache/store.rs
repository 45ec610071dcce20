// Cache store for search results keyed by query string.
// Handles JSON serialization, TTL checking, and atomic filesystem writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::error::CacheError;
use super::paths::{TEMP_EXTENSION, entry_path};

/// Default TTL for search results: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk representation of one cached query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<R> {
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// `created_at + ttl`; the entry is valid strictly before this instant.
    pub expires_at: DateTime<Utc>,
    /// The exact query string the key was derived from.
    pub query: String,
    /// The cached records, in the order they were fetched.
    pub records: R,
}

impl<R> CacheEntry<R> {
    /// Create an entry stamped at `now`.
    pub fn new(query: &str, records: R, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            query: query.to_string(),
            records,
        }
    }

    /// Check whether the entry is stale at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of a cache lookup, separating hits from the reason for a miss.
#[derive(Debug)]
pub enum CacheLookup<T> {
    Hit(Vec<T>),
    Miss(CacheError),
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

/// TTL-bounded, one-file-per-query JSON cache rooted at a single directory.
#[derive(Debug, Clone)]
pub struct QueryCache {
    root: PathBuf,
    ttl: Duration,
}

impl QueryCache {
    /// Open a cache at `root`, creating the directory and its parents.
    pub fn open(root: impl Into<PathBuf>, ttl: Duration) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        debug!(root = %root.display(), ttl = ?ttl, "Opened query cache");
        Ok(Self { root, ttl })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the entry for `query`.
    pub fn path_for(&self, query: &str) -> PathBuf {
        entry_path(&self.root, query)
    }

    /// Write `records` for `query`, replacing any previous entry.
    pub fn save<T: Serialize>(&self, query: &str, records: &[T]) -> Result<(), CacheError> {
        self.save_at(query, records, Utc::now())
    }

    /// Write `records` for `query` as if the current time were `now`.
    pub fn save_at<T: Serialize>(
        &self,
        query: &str,
        records: &[T],
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let path = self.path_for(query);
        let entry = CacheEntry::new(query, records, now, self.chrono_ttl());
        let json = serde_json::to_string_pretty(&entry)?;

        // Write atomically via temp file
        let temp_path = path.with_extension(TEMP_EXTENSION);
        write_synced(&temp_path, json.as_bytes()).map_err(|e| CacheError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| CacheError::io(&path, e))?;

        debug!(
            path = %path.display(),
            records = records.len(),
            ttl = ?self.ttl,
            query,
            "Cached search results"
        );
        Ok(())
    }

    /// Read the records for `query`.
    ///
    /// An expired entry is deleted before `Expired` is returned, so the next
    /// load for the same query reports `NotFound`.
    pub fn load<T: DeserializeOwned>(&self, query: &str) -> Result<Vec<T>, CacheError> {
        self.load_at(query, Utc::now())
    }

    /// Read the records for `query` as if the current time were `now`.
    pub fn load_at<T: DeserializeOwned>(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<T>, CacheError> {
        let path = self.path_for(query);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound { path });
            }
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let entry: CacheEntry<Vec<T>> = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(source) => return Err(CacheError::Decode { path, source }),
        };

        if entry.is_expired_at(now) {
            // Best effort; the caller sees Expired either way.
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove expired cache entry");
            }
            debug!(
                ttl = ?self.ttl,
                age = %(now - entry.created_at),
                query,
                "Cache expired, removed file"
            );
            return Err(CacheError::Expired {
                path,
                expired_at: entry.expires_at,
            });
        }

        debug!(
            path = %path.display(),
            records = entry.records.len(),
            query,
            "Loaded from cache"
        );
        Ok(entry.records)
    }

    /// Tagged form of [`QueryCache::load`].
    pub fn lookup<T: DeserializeOwned>(&self, query: &str) -> CacheLookup<T> {
        match self.load(query) {
            Ok(records) => CacheLookup::Hit(records),
            Err(reason) => CacheLookup::Miss(reason),
        }
    }

    fn chrono_ttl(&self) -> TimeDelta {
        TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        number: u64,
        title: String,
    }

    fn records(prefix: &str, n: u64) -> Vec<TestRecord> {
        (1..=n)
            .map(|number| TestRecord {
                number,
                title: format!("{} {}", prefix, number),
            })
            .collect()
    }

    fn create_test_cache(ttl: Duration) -> (QueryCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = QueryCache::open(temp_dir.path().join("cache"), ttl).unwrap();
        (cache, temp_dir)
    }

    #[test]
    fn test_open_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a").join("b").join("c");

        let cache = QueryCache::open(&root, DEFAULT_TTL).unwrap();

        assert!(root.is_dir());
        assert_eq!(cache.root(), root.as_path());
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_open_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let err = QueryCache::open(&file, DEFAULT_TTL).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);
        let data = records("issue", 5);

        cache.save("repo:a/b is:pr", &data).unwrap();
        let loaded: Vec<TestRecord> = cache.load("repo:a/b is:pr").unwrap();

        assert_eq!(loaded, data);
    }

    #[test]
    fn test_save_empty_result_set() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);

        cache.save::<TestRecord>("nothing", &[]).unwrap();
        let loaded: Vec<TestRecord> = cache.load("nothing").unwrap();

        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);

        let err = cache.load::<TestRecord>("never saved").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let ttl = Duration::from_secs(3600);
        let (cache, _temp_dir) = create_test_cache(ttl);
        let created = Utc::now();

        cache.save_at("q", &records("issue", 2), created).unwrap();
        let path = cache.path_for("q");
        assert!(path.exists());

        let just_before = created + TimeDelta::seconds(3599);
        assert_eq!(cache.load_at::<TestRecord>("q", just_before).unwrap().len(), 2);

        let at_expiry = created + TimeDelta::seconds(3600);
        let err = cache.load_at::<TestRecord>("q", at_expiry).unwrap_err();
        assert!(matches!(err, CacheError::Expired { .. }));
        assert!(!path.exists());

        let later = created + TimeDelta::days(30);
        let err = cache.load_at::<TestRecord>("q", later).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_key_isolation() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);
        let x = records("x", 3);
        let y = records("y", 4);

        cache.save("query a", &x).unwrap();
        cache.save("query b", &y).unwrap();

        assert_eq!(cache.load::<TestRecord>("query a").unwrap(), x);
        assert_eq!(cache.load::<TestRecord>("query b").unwrap(), y);
    }

    #[test]
    fn test_save_overwrites_previous_entry() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);

        cache.save("q", &records("old", 3)).unwrap();
        cache.save("q", &records("new", 1)).unwrap();

        assert_eq!(cache.load::<TestRecord>("q").unwrap(), records("new", 1));
    }

    #[test]
    fn test_entry_file_contents() {
        let ttl = Duration::from_secs(90);
        let (cache, _temp_dir) = create_test_cache(ttl);
        let now = Utc::now();
        let query = "repo:a/b created:>2024-01-01 is:pr";

        cache.save_at(query, &records("t", 1), now).unwrap();

        let contents = fs::read_to_string(cache.path_for(query)).unwrap();
        let entry: CacheEntry<Vec<TestRecord>> = serde_json::from_str(&contents).unwrap();
        assert_eq!(entry.query, query);
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.expires_at, now + TimeDelta::seconds(90));
        assert_eq!(entry.records, records("t", 1));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);

        cache.save("q", &records("t", 2)).unwrap();

        let names: Vec<_> = fs::read_dir(cache.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[test]
    fn test_corrupt_entry_is_decode_error() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);
        fs::write(cache.path_for("q"), "{ not json").unwrap();

        let err = cache.load::<TestRecord>("q").unwrap_err();
        assert!(matches!(err, CacheError::Decode { .. }));
        // Corrupt entries are left alone; the next save replaces them.
        assert!(cache.path_for("q").exists());
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let (cache, _temp_dir) = create_test_cache(DEFAULT_TTL);
        cache.save("hit", &records("t", 1)).unwrap();

        match cache.lookup::<TestRecord>("hit") {
            CacheLookup::Hit(found) => assert_eq!(found, records("t", 1)),
            CacheLookup::Miss(reason) => panic!("unexpected miss: {}", reason),
        }

        let miss = cache.lookup::<TestRecord>("miss");
        assert!(!miss.is_hit());
        assert!(matches!(miss, CacheLookup::Miss(CacheError::NotFound { .. })));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let (cache, _temp_dir) = create_test_cache(Duration::ZERO);
        let now = Utc::now();

        cache.save_at("q", &records("t", 1), now).unwrap();

        let err = cache.load_at::<TestRecord>("q", now).unwrap_err();
        assert!(matches!(err, CacheError::Expired { .. }));
    }
}
