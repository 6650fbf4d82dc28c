//! Durable key/value storage behind the [`ExpiringCache`](super::ExpiringCache).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use snafu::{Backtrace, ResultExt, Snafu};

/// Errors raised by a [`CacheStore`] or while (de)serializing cache entries.
///
/// [`ExpiringCache`](super::ExpiringCache) absorbs all of them: read and
/// decode failures become a miss, write and encode failures are logged.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CacheError {
    #[snafu(display("Failed to read cache file {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to write cache file {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to create cache directory {}: {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Cache entry '{key}' is not decodable: {source}"))]
    Decode {
        key: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Cache entry '{key}' could not be encoded: {source}"))]
    Encode {
        key: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

/// Minimal durable key/value contract needed by the cache.
pub trait CacheStore {
    /// Returns the bytes stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `bytes` under `key`, replacing any previous value.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStore for &S {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        (**self).write(key, bytes)
    }
}

/// One JSON file per key inside a directory.
///
/// Keys are mapped to file names by replacing every character outside
/// `[A-Za-z0-9_.-]` with `_`, so distinct keys may share a file; the cache
/// stores the key inside the entry and treats a mismatch as a miss.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context(ReadSnafu { path }),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).context(CreateDirSnafu { path: &self.dir })?;

        // Write to a sibling and rename so readers never see a half-written entry.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).context(WriteSnafu { path: &tmp })?;
        fs::rename(&tmp, &path).context(WriteSnafu { path })
    }
}
