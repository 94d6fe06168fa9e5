use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use xxhash_rust::xxh3::xxh3_128;

use crate::assets::query::ActivityType;
use crate::foundation::error::{ReelError, ReelResult};

const CACHE_EXT: &str = "jpg";
const TEMP_PREFIX: &str = ".partial-";

/// Cache key for one (query, source, index, activity type) combination.
///
/// Rendered as `{source}_{hash}` so cache files stay greppable by source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(query: &str, source: &str, index: u64, activity_type: ActivityType) -> Self {
        let key = format!("{query}_{source}_{index}_{activity_type}");
        Self(format!("{source}_{:032x}", xxh3_128(key.as_bytes())))
    }

    /// Fixed key of placeholder slot `slot`.
    pub fn placeholder(slot: usize) -> Self {
        Self(format!("placeholder_{slot}"))
    }

    /// Key of the locally synthesized stand-in for placeholder slot `slot`.
    pub fn local_placeholder(slot: usize) -> Self {
        Self(format!("placeholder_{slot}_local"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure of [`ImageCacheStore::get_or_create`]: either the fetch itself or local disk I/O.
#[derive(Debug)]
pub enum CacheError<E> {
    Fetch(E),
    Io(ReelError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// `true` when this call ran the fetch and wrote the file.
    pub fetched: bool,
}

/// Content-addressed on-disk image store.
///
/// Entries are immutable once written and never expire; `clear` is the only eviction.
/// Writes go through a temp file in the same directory and are renamed into place without
/// clobbering, so readers never see a partial file and the first writer wins.
#[derive(Debug)]
pub struct ImageCacheStore {
    dir: PathBuf,
    fetch_count: AtomicU64,
}

impl ImageCacheStore {
    pub fn open(dir: impl Into<PathBuf>) -> ReelResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create cache directory '{}'", dir.display()))
            .map_err(|e| ReelError::cache_io(format!("{e:#}")))?;
        Ok(Self {
            dir,
            fetch_count: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, fp: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.{CACHE_EXT}", fp.as_str()))
    }

    pub fn lookup(&self, fp: &Fingerprint) -> Option<PathBuf> {
        let path = self.path_for(fp);
        path.is_file().then_some(path)
    }

    /// Number of fetch closures this store has run.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Return the cached file for `fp`, running `fetch` only when it is absent.
    pub fn get_or_create<E>(
        &self,
        fp: &Fingerprint,
        fetch: impl FnOnce() -> Result<Vec<u8>, E>,
    ) -> Result<CacheEntry, CacheError<E>> {
        if let Some(path) = self.lookup(fp) {
            tracing::debug!(fingerprint = %fp, "image cache hit");
            return Ok(CacheEntry {
                path,
                fetched: false,
            });
        }

        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        let bytes = fetch().map_err(CacheError::Fetch)?;
        let path = self.write_atomic(fp, &bytes).map_err(CacheError::Io)?;
        Ok(CacheEntry {
            path,
            fetched: true,
        })
    }

    /// Store `bytes` under `fp` unless an entry already exists.
    pub fn insert(&self, fp: &Fingerprint, bytes: &[u8]) -> ReelResult<PathBuf> {
        if let Some(path) = self.lookup(fp) {
            return Ok(path);
        }
        self.write_atomic(fp, bytes)
    }

    fn write_atomic(&self, fp: &Fingerprint, bytes: &[u8]) -> ReelResult<PathBuf> {
        let path = self.path_for(fp);

        // The temp file is removed on drop if anything below fails.
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| io_err("create temp file for", &path, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| io_err("write temp file for", &path, e))?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(path),
            Err(e) if path.is_file() => {
                tracing::debug!(fingerprint = %fp, "cache entry written concurrently, keeping first");
                drop(e.file);
                Ok(path)
            }
            Err(e) => Err(io_err("persist cache entry", &path, e.error)),
        }
    }

    /// Delete every cached entry and stray temp file. Returns the number of files removed.
    pub fn clear(&self) -> ReelResult<usize> {
        let rd = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(ReelError::cache_io(format!(
                    "read cache directory '{}': {e}",
                    self.dir.display()
                )));
            }
        };

        let mut removed = 0usize;
        for entry in rd.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file"),
            }
        }
        tracing::info!(removed, dir = %self.dir.display(), "image cache cleared");
        Ok(removed)
    }
}

fn io_err(what: &str, path: &Path, e: std::io::Error) -> ReelError {
    ReelError::cache_io(format!("{what} '{}': {e}", path.display()))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
