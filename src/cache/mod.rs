//! Recent verdicts, persisted between sessions.
//!
//! The persisted form is a JSON list of `[email, entry]` pairs, oldest first.
//! On every save, entries older than the TTL are dropped and only the newest
//! `max_entries` survive. Unreadable persisted data is treated as an empty
//! cache.

pub mod store;

pub use store::{CacheStore, FileStore, MemoryStore};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::MergedResult;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// A merged result stamped with the time it was written (epoch millis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub result: MergedResult,
    pub timestamp: i64,
    /// Whether the endpoint produced this verdict. Placeholders for failed
    /// batches and client-only rows are stored but never reused.
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    entry: CacheEntry,
}

/// Counts reported by [`ResultCache::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    entries: HashMap<String, Slot>,
    next_seq: u64,
    ttl_ms: i64,
    max_entries: usize,
}

impl ResultCache {
    /// Opens the store named by the config, or an in-memory one when caching
    /// is disabled.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn CacheStore> = match &config.cache_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::load(store, config.cache_ttl, config.cache_max_entries)
    }

    /// Reads the store once. Any failure leaves the cache empty.
    pub fn load(store: Arc<dyn CacheStore>, ttl: Duration, max_entries: usize) -> Self {
        let mut cache = Self {
            store,
            entries: HashMap::new(),
            next_seq: 0,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            max_entries: max_entries.max(1),
        };

        let raw = match cache.store.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return cache,
            Err(e) => {
                tracing::warn!(target: "cache", "Failed to read cache from {}: {}", cache.store.describe(), e);
                return cache;
            }
        };

        match serde_json::from_str::<Vec<(String, CacheEntry)>>(&raw) {
            Ok(pairs) => {
                for (email, entry) in pairs {
                    cache.put(email, entry);
                }
                tracing::debug!(target: "cache", "Loaded {} cached verdicts", cache.entries.len());
            }
            Err(e) => {
                tracing::warn!(target: "cache", "Ignoring corrupt cache at {}: {}", cache.store.describe(), e);
            }
        }
        cache
    }

    fn put(&mut self, email: String, entry: CacheEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(email, Slot { seq, entry });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores every result under its email, replacing older entries.
    /// Emails in `verified` are marked as answered by the endpoint.
    pub fn record(&mut self, results: &[MergedResult], verified: &HashSet<String>) {
        self.record_at(results, verified, Utc::now());
    }

    pub fn record_at(
        &mut self,
        results: &[MergedResult],
        verified: &HashSet<String>,
        now: DateTime<Utc>,
    ) {
        let timestamp = now.timestamp_millis();
        for result in results {
            self.put(
                result.email.clone(),
                CacheEntry {
                    result: result.clone(),
                    timestamp,
                    verified: verified.contains(&result.email),
                },
            );
        }
    }

    /// Returns the entry for `email` if it is still within the TTL.
    pub fn get(&self, email: &str) -> Option<&CacheEntry> {
        self.get_at(email, Utc::now())
    }

    pub fn get_at(&self, email: &str, now: DateTime<Utc>) -> Option<&CacheEntry> {
        let now_ms = now.timestamp_millis();
        self.entries
            .get(email)
            .map(|slot| &slot.entry)
            .filter(|entry| self.is_fresh(entry, now_ms))
    }

    fn is_fresh(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        now_ms.saturating_sub(entry.timestamp) <= self.ttl_ms
    }

    /// Drops expired entries, then the oldest ones beyond the cap.
    pub fn prune_at(&mut self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let before = self.entries.len();
        let ttl_ms = self.ttl_ms;
        self.entries
            .retain(|_, slot| now_ms.saturating_sub(slot.entry.timestamp) <= ttl_ms);

        if self.entries.len() > self.max_entries {
            let mut seqs: Vec<u64> = self.entries.values().map(|slot| slot.seq).collect();
            seqs.sort_unstable();
            let cutoff = seqs[seqs.len() - self.max_entries];
            self.entries.retain(|_, slot| slot.seq >= cutoff);
        }

        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!(target: "cache", "Pruned {} cache entries", dropped);
        }
    }

    fn ordered_pairs(&self) -> Vec<(&String, &CacheEntry)> {
        let mut slots: Vec<(&String, &Slot)> = self.entries.iter().collect();
        slots.sort_by_key(|(_, slot)| slot.seq);
        slots
            .into_iter()
            .map(|(email, slot)| (email, &slot.entry))
            .collect()
    }

    pub fn save(&mut self) -> Result<()> {
        self.save_at(Utc::now())
    }

    /// Prunes relative to `now` and rewrites the store.
    pub fn save_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.prune_at(now);
        let serialized = serde_json::to_string(&self.ordered_pairs())?;
        self.store.save(&serialized)?;
        tracing::debug!(target: "cache",
            "Saved {} verdicts to {}", self.entries.len(), self.store.describe());
        Ok(())
    }

    /// Forgets everything, in memory and in the store.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.next_seq = 0;
        self.store.clear()?;
        tracing::info!(target: "cache", "Cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        let now_ms = now.timestamp_millis();
        let timestamps = self.entries.values().map(|slot| slot.entry.timestamp);
        CacheStats {
            entries: self.entries.len(),
            fresh: self
                .entries
                .values()
                .filter(|slot| self.is_fresh(&slot.entry, now_ms))
                .count(),
            oldest: timestamps
                .clone()
                .min()
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            newest: timestamps.max().and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }

    pub fn location(&self) -> String {
        self.store.describe()
    }
}
