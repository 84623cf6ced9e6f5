//! Local series cache keyed by coordinates and requested range.
//!
//! Entries expire after a TTL because the reading for "today" keeps
//! changing, and never outlive the calendar day they were fetched on: a
//! trailing-day key covers a different window once the date rolls over.
//! Store failures never fail a lookup; they are logged and the cache
//! behaves as a miss.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{self, Debug},
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{debug, warn};

use crate::{Clock, Config, Coordinates, RangeSpec, TemperatureSeries};

/// Composite cache key: `tavg:{lat},{lon}:{span}`.
///
/// Coordinates are rounded to four decimals (about 11 m), the span is
/// `{n}d` for trailing day counts or `{start}..{end}` for explicit bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(coords: Coordinates, range: &RangeSpec) -> Self {
        let span = match range {
            RangeSpec::LastDays(n) => format!("{n}d"),
            RangeSpec::Explicit { start, end } => format!("{start}..{end}"),
        };
        Self(format!("tavg:{:.4},{:.4}:{span}", coords.latitude, coords.longitude))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub series: TemperatureSeries,
    pub fetched_at: DateTime<Utc>,
}

/// Raw key-value persistence behind [`SeriesCache`].
pub trait SeriesStore: Send + Sync + Debug {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>>;
    fn save(&self, key: &str, entry: CacheEntry) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries.lock().map_err(|_| anyhow!("In-memory cache lock poisoned"))
    }
}

impl SeriesStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, entry: CacheEntry) -> Result<()> {
        self.entries()?.insert(key.to_string(), entry);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries()?.clear();
        Ok(())
    }
}

/// All entries in one JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, CacheEntry>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache file: {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", self.path.display()))
    }

    fn write_all(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(entries).context("Failed to serialize cache")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))
    }
}

impl SeriesStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, entry: CacheEntry) -> Result<()> {
        // A corrupt file is replaced rather than blocking every write.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            warn!("Discarding unreadable cache file: {e:#}");
            HashMap::new()
        });
        entries.insert(key.to_string(), entry);
        self.write_all(&entries)
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to delete cache file: {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeriesCache {
    store: Box<dyn SeriesStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl SeriesCache {
    pub fn new(store: Box<dyn SeriesStore>, clock: Arc<dyn Clock>, ttl: chrono::Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn in_memory(clock: Arc<dyn Clock>, ttl: chrono::Duration) -> Self {
        Self::new(Box::new(MemoryStore::new()), clock, ttl)
    }

    /// The on-disk cache at [`Config::cache_file_path`] with the configured TTL.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = JsonFileStore::new(Config::cache_file_path()?);
        Ok(Self::new(Box::new(store), clock, config.cache_ttl()))
    }

    /// Fresh entry for `key`, if any. Never touches the network.
    pub fn get(&self, key: &CacheKey) -> Option<TemperatureSeries> {
        let entry = match self.store.load(key.as_str()) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(%key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(%key, "Cache lookup failed, treating as miss: {e:#}");
                return None;
            }
        };

        let now = self.clock.now();
        if entry.fetched_at.date_naive() != now.date_naive() {
            let fetched_on = entry.fetched_at.date_naive();
            debug!(%key, %fetched_on, "cache entry from another day");
            return None;
        }

        let age = now - entry.fetched_at;
        if age > self.ttl {
            debug!(%key, age_secs = age.num_seconds(), "cache entry expired");
            return None;
        }

        debug!(%key, "cache hit");
        Some(entry.series)
    }

    /// Store `series` under `key`, replacing whatever was there.
    pub fn put(&self, key: &CacheKey, series: TemperatureSeries) {
        let entry = CacheEntry { series, fetched_at: self.clock.now() };
        if let Err(e) = self.store.save(key.as_str(), entry) {
            warn!(%key, "Failed to store series in cache: {e:#}");
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
