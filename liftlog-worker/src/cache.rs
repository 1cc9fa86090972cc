//! Versioned, bounded response caches.
//!
//! Every cache name embeds [`CACHE_VERSION`], so bumping the constant makes
//! all previous-generation caches unrecognizable and the activate step
//! deletes them. Entries age out and each cache holds a bounded number of
//! entries, evicted oldest-first.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::fetch::{FetchResponse, ResponseSource};

/// Bump whenever the strategy table or the precache set changes.
pub const CACHE_VERSION: &str = "v4";

pub fn versioned_cache_name(class: &str) -> String {
    format!("liftlog-{class}-{CACHE_VERSION}")
}

#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    pub max_entries: usize,
    pub max_age: Duration,
}

struct CacheEntry {
    response: FetchResponse,
    stored_at: Instant,
}

pub struct Cache {
    limits: CacheLimits,
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest at the front.
    order: VecDeque<String>,
}

impl Cache {
    fn new(limits: CacheLimits) -> Self {
        Self {
            limits,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn put(&mut self, path: &str, response: FetchResponse) {
        if self.entries.insert(
            path.to_string(),
            CacheEntry {
                response,
                stored_at: Instant::now(),
            },
        )
        .is_some()
        {
            self.order.retain(|p| p != path);
        }
        self.order.push_back(path.to_string());

        while self.order.len() > self.limits.max_entries {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    /// A hit comes back marked as served from cache. Expired entries are
    /// dropped on access and count as misses.
    pub fn get(&mut self, path: &str) -> Option<FetchResponse> {
        let entry = self.entries.get(path)?;
        if entry.stored_at.elapsed() > self.limits.max_age {
            self.entries.remove(path);
            self.order.retain(|p| p != path);
            return None;
        }
        let mut response = entry.response.clone();
        response.source = ResponseSource::Cache;
        Some(response)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All named caches the controller owns.
#[derive(Default)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, name: &str, limits: CacheLimits) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(limits))
    }

    pub fn existing(&mut self, name: &str) -> Option<&mut Cache> {
        self.caches.get_mut(name)
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Drop every cache whose name does not carry the current version tag.
    /// Runs at activation, so a version bump naturally invalidates previous
    /// generations.
    pub fn prune_stale_versions(&mut self) -> Vec<String> {
        let suffix = format!("-{CACHE_VERSION}");
        let stale: Vec<String> = self
            .caches
            .keys()
            .filter(|name| !name.ends_with(&suffix))
            .cloned()
            .collect();
        for name in &stale {
            self.caches.remove(name);
        }
        stale
    }
}
