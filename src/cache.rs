// In-memory LRU cache for rendered ladder responses.
//
// Rebuilding a ladder replays the whole game history, so repeated requests
// for the same (genus, region) pair are served from here. Entries have no
// TTL; they live until evicted by capacity or the process restarts, which
// matches how often the underlying database changes (batch imports,
// followed by a restart).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::metrics;

struct CacheInner {
    capacity: usize,
    entries: HashMap<String, String>,
    // Keys from least to most recently used.
    order: Vec<String>,
}

/// Thread-safe bounded cache of rendered responses, keyed by query string.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                capacity: capacity.max(1),
                entries: HashMap::new(),
                order: Vec::new(),
            })),
        }
    }

    /// Fetch a cached response, marking the key as recently used.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        let hit = inner.entries.get(key).cloned();
        match hit {
            Some(value) => {
                inner.order.retain(|k| k != key);
                inner.order.push(key.to_string());
                metrics::CACHE_HITS_TOTAL.inc();
                Some(value)
            }
            None => {
                metrics::CACHE_MISSES_TOTAL.inc();
                None
            }
        }
    }

    /// Store a response, evicting the least recently used entry when full.
    pub fn insert(&self, key: &str, value: String) {
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.contains_key(key) {
            inner.order.retain(|k| k != key);
        } else if inner.entries.len() >= inner.capacity {
            let evicted = inner.order.remove(0);
            inner.entries.remove(&evicted);
        }
        inner.entries.insert(key.to_string(), value);
        inner.order.push(key.to_string());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
