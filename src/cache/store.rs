//! LRU storage for query results with freshness tracking.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::config::QueryCacheConfig;
use super::keys::{QueryKey, QueryValue};
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

struct Entry {
    value: QueryValue,
    fetched_at: Instant,
}

pub struct QueryStore {
    entries: Mutex<LruCache<QueryKey, Entry>>,
    stale_after: Duration,
}

impl QueryStore {
    pub fn new(config: &QueryCacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.capacity_non_zero())),
            stale_after: config.stale_after,
        }
    }

    /// Return the cached value if it is younger than `stale_after`.
    /// Stale entries are dropped.
    pub fn get_fresh(&self, key: &QueryKey) -> Option<QueryValue> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get_fresh");
        let cached = entries.get(key).map(|entry| {
            (entry.fetched_at.elapsed() < self.stale_after).then(|| entry.value.clone())
        });
        let fresh = match cached {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                debug!(key = ?key, "Dropped stale query entry");
                None
            }
            None => None,
        };
        drop(entries);

        match fresh {
            Some(value) => {
                counter!("mosaico_query_hit_total", "query" => key.kind()).increment(1);
                Some(value)
            }
            None => {
                counter!("mosaico_query_miss_total", "query" => key.kind()).increment(1);
                None
            }
        }
    }

    pub fn put(&self, key: QueryKey, value: QueryValue) {
        let entry = Entry {
            value,
            fetched_at: Instant::now(),
        };
        let evicted = mutex_lock(&self.entries, SOURCE, "put").push(key.clone(), entry);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                counter!("mosaico_query_evict_total", "query" => evicted_key.kind()).increment(1);
                debug!(key = ?evicted_key, "Evicted query entry");
            }
        }
    }

    /// Drop every entry whose key matches; returns how many were removed.
    pub fn invalidate<F>(&self, matches: F) -> usize
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut entries = mutex_lock(&self.entries, SOURCE, "invalidate");
        let doomed: Vec<QueryKey> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| matches(*key))
            .cloned()
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        drop(entries);

        if !doomed.is_empty() {
            counter!("mosaico_query_invalidate_total").increment(doomed.len() as u64);
        }
        doomed.len()
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        mutex_lock(&self.entries, SOURCE, "contains").contains(key)
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
