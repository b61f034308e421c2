//! Metadata cache for directory scans.
//!
//! Extracted records are cached per file, keyed on the file's path and
//! modification time, so an edited file is always re-read. Entries live in a
//! bounded in-memory layer with a time-to-live and, optionally, as JSON files
//! in a cache directory that survives between runs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::graph::MetadataRecord;

/// Default number of entries held in memory.
pub const DEFAULT_MEMORY_CAPACITY: usize = 100;

/// Default lifetime of an in-memory entry (5 minutes).
pub const DEFAULT_MEMORY_TTL: Duration = Duration::from_secs(300);

const CACHE_FILE_EXTENSION: &str = "json";

/// Errors that can occur while managing the on-disk cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to read or write the cache directory.
    #[error("Cache I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A cache file could not be encoded or decoded.
    #[error("Invalid cache entry: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
struct MemoryEntry {
    stored_at: Instant,
    records: Vec<MetadataRecord>,
}

/// A two-level cache of extracted records.
///
/// Lookups and inserts take `&self`, so a single cache can be shared by the
/// worker threads of a parallel scan.
///
/// # Example
///
/// ```
/// use metagraph::cache::MetadataCache;
/// use metagraph::graph::MetadataRecord;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("sample.c");
/// std::fs::write(&path, "int main(void);").unwrap();
///
/// let cache = MetadataCache::in_memory();
/// assert!(cache.get(&path).is_none());
///
/// cache.insert(&path, &[MetadataRecord::leaf("main")]);
/// assert_eq!(cache.get(&path).unwrap()[0].name, "main");
/// ```
#[derive(Debug)]
pub struct MetadataCache {
    directory: Option<PathBuf>,
    capacity: usize,
    ttl: Duration,
    memory: Mutex<HashMap<String, MemoryEntry>>,
}

impl MetadataCache {
    /// Creates a cache that only keeps entries in memory.
    pub fn in_memory() -> Self {
        Self {
            directory: None,
            capacity: DEFAULT_MEMORY_CAPACITY,
            ttl: DEFAULT_MEMORY_TTL,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a cache that also persists entries under `directory`.
    ///
    /// The directory is created if it does not exist.
    pub fn with_directory(directory: impl Into<PathBuf>) -> CacheResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            directory: Some(directory),
            ..Self::in_memory()
        })
    }

    /// Sets how long an in-memory entry stays valid.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the maximum number of in-memory entries.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns the on-disk cache directory, if any.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Returns the cached records for `path`, if its current version is cached.
    pub fn get(&self, path: &Path) -> Option<Vec<MetadataRecord>> {
        let key = cache_key(path).ok()?;

        {
            let mut memory = self.lock();
            match memory.get(&key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.records.clone());
                }
                Some(_) => {
                    memory.remove(&key);
                }
                None => {}
            }
        }

        let file = self.entry_path(&key)?;
        let content = fs::read_to_string(&file).ok()?;
        match serde_json::from_str::<Vec<MetadataRecord>>(&content) {
            Ok(records) => {
                self.remember(key, records.clone());
                Some(records)
            }
            Err(e) => {
                debug!(path = %file.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Stores the records extracted from `path`.
    ///
    /// Failing to write the on-disk entry is logged; the in-memory entry is
    /// still kept.
    pub fn insert(&self, path: &Path, records: &[MetadataRecord]) {
        let key = match cache_key(path) {
            Ok(key) => key,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot stat file, not caching");
                return;
            }
        };

        if let Some(file) = self.entry_path(&key) {
            if let Err(e) = write_entry(&file, records) {
                warn!(path = %file.display(), error = %e, "Failed to write cache entry");
            }
        }

        self.remember(key, records.to_vec());
    }

    /// Returns the number of live in-memory entries.
    pub fn memory_len(&self) -> usize {
        let ttl = self.ttl;
        self.lock()
            .values()
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .count()
    }

    /// Clears the cache.
    ///
    /// With `older_than`, only on-disk entries last written before that age
    /// are removed; the in-memory layer is always emptied. Returns the number
    /// of files removed.
    pub fn clear(&self, older_than: Option<Duration>) -> CacheResult<usize> {
        self.lock().clear();

        let Some(directory) = &self.directory else {
            return Ok(0);
        };

        let cutoff = older_than.and_then(|age| SystemTime::now().checked_sub(age));
        let mut removed = 0;

        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_FILE_EXTENSION) {
                continue;
            }
            if let Some(cutoff) = cutoff {
                if fs::metadata(&path)?.modified()? >= cutoff {
                    continue;
                }
            }
            fs::remove_file(&path)?;
            removed += 1;
        }

        debug!(directory = %directory.display(), removed, "Cleared metadata cache");
        Ok(removed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemoryEntry>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", key, CACHE_FILE_EXTENSION)))
    }

    fn remember(&self, key: String, records: Vec<MetadataRecord>) {
        let mut memory = self.lock();

        if !memory.contains_key(&key) && memory.len() >= self.capacity {
            let oldest = memory
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                memory.remove(&oldest);
            }
        }

        memory.insert(
            key,
            MemoryEntry {
                stored_at: Instant::now(),
                records,
            },
        );
    }
}

fn write_entry(file: &Path, records: &[MetadataRecord]) -> CacheResult<()> {
    fs::write(file, serde_json::to_string(records)?)?;
    Ok(())
}

/// Derives the cache key for the current version of `path`.
fn cache_key(path: &Path) -> io::Result<String> {
    let mtime_ns = fs::metadata(path)?
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());

    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", path.display(), mtime_ns).as_bytes());

    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect())
}
