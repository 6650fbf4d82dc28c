//! Time-bounded memoization of expensive computations, persisted to disk.
//!
//! [`ExpiringCache`] wraps a [`CacheStore`] and memoizes whatever a call site
//! computes under an explicit key and time-to-live. An entry is served only
//! while its expiry is strictly in the future; otherwise the computation runs
//! again and its result overwrites the entry with a fresh expiry.
//!
//! The cache never fails a caller because of its own storage: unreadable,
//! missing or corrupt entries are misses, and a failed write is logged while
//! the freshly computed value is still returned.
//!
//! There is no mutual exclusion around read, compute and write. Two processes
//! missing on the same key at the same time both compute and both write, and
//! the last writer wins. Callers needing single-flight semantics must add a
//! per-key lock on top.
//!
//! # Example
//!
//! ```no_run
//! use rate_spreads::cache::{ExpiringCache, FileCacheStore};
//!
//! let cache = ExpiringCache::new(FileCacheStore::new(".cache"));
//! let answer: u64 = cache.get_or_compute("answer", None, || 42);
//! assert_eq!(answer, 42);
//! ```

mod store;

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use tracing::{debug, warn};

pub use store::{CacheError, CacheStore, FileCacheStore};

/// TTL applied when a call site does not pass one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Source of "now" for expiry decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Identity of a cached value.
///
/// `name` selects the stored entry; `request` describes the inputs the value
/// was computed from. An entry is served only when both match, so a changed
/// request recomputes and replaces the entry stored under the same name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheKey {
    pub name: String,
    pub request: String,
}

impl CacheKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: String::new(),
        }
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = request.into();
        self
    }
}

impl From<&str> for CacheKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CacheKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&CacheKey> for CacheKey {
    fn from(key: &CacheKey) -> Self {
        key.clone()
    }
}

/// What is persisted under a cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Key name the entry was written under.
    pub key: String,
    /// Request the entry was computed for.
    #[serde(default)]
    pub request: String,
    /// The entry is served while `now < expiry`.
    pub expiry: DateTime<Utc>,
    /// Memoized value.
    pub data: T,
}

/// Memoizes computations in a durable [`CacheStore`] with a per-call TTL.
#[derive(Clone)]
pub struct ExpiringCache<S> {
    store: S,
    clock: Clock,
}

impl<S: CacheStore> ExpiringCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, mainly for tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Returns the value cached under `key` if it has not expired, otherwise
    /// runs `compute`, persists its result for `ttl` (default one day) and
    /// returns it.
    pub fn get_or_compute<T, F>(
        &self,
        key: impl Into<CacheKey>,
        ttl: Option<Duration>,
        compute: F,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let key = key.into();
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let data = compute();
        self.insert(&key, ttl, &data);
        data
    }

    /// Async, fallible form of [`get_or_compute`](Self::get_or_compute).
    ///
    /// An `Err` from `compute` is handed back to the caller and nothing is
    /// written, so the next call tries again.
    pub async fn get_or_try_compute<T, E, F, Fut>(
        &self,
        key: impl Into<CacheKey>,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.into();
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let data = compute().await?;
        self.insert(&key, ttl, &data);
        Ok(data)
    }

    /// Reads and decodes the entry stored under `key`, expired or not.
    ///
    /// An entry written for another key name or another request is `None`.
    pub fn read_entry<T: DeserializeOwned>(
        &self,
        key: impl Into<CacheKey>,
    ) -> Result<Option<CacheEntry<T>>, CacheError> {
        let key = key.into();
        let Some(bytes) = self.store.read(&key.name)? else {
            return Ok(None);
        };
        let entry: CacheEntry<T> =
            serde_json::from_slice(&bytes).context(store::DecodeSnafu { key: &key.name })?;
        // Sanitized file names can collide, so the name is checked too.
        Ok((entry.key == key.name && entry.request == key.request).then_some(entry))
    }

    /// The value cached under `key` if it is still fresh. Never fails; an
    /// unusable entry is logged and reported as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: impl Into<CacheKey>) -> Option<T> {
        let key = key.into();
        let name = key.name.as_str();
        let entry = match self.read_entry::<T>(&key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(key = name, "cache miss");
                return None;
            }
            Err(err) => {
                warn!(key = name, error = %err, "unusable cache entry, recomputing");
                return None;
            }
        };

        let now = self.now();
        if entry.expiry > now {
            debug!(key = name, expiry = %entry.expiry, "cache hit");
            Some(entry.data)
        } else {
            debug!(key = name, expiry = %entry.expiry, %now, "cache entry expired");
            None
        }
    }

    /// Stores `data` under `key` for `ttl` (default one day). A failed write
    /// is logged, not returned.
    pub fn insert<T: Serialize>(
        &self,
        key: impl Into<CacheKey>,
        ttl: Option<Duration>,
        data: &T,
    ) {
        let key = key.into();
        let name = key.name.as_str();
        let expiry = expiry_after(self.now(), ttl.unwrap_or(DEFAULT_TTL));
        let entry = CacheEntry {
            key: key.name.clone(),
            request: key.request.clone(),
            expiry,
            data,
        };

        let written = serde_json::to_vec(&entry)
            .context(store::EncodeSnafu { key: name })
            .and_then(|bytes| self.store.write(name, &bytes));

        match written {
            Ok(()) => debug!(key = name, %expiry, "cache entry written"),
            Err(err) => {
                warn!(key = name, error = %err, "cache write failed, returning uncached value")
            }
        }
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
