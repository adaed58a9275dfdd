//! TTL cache for remote-fetched store objects.
//!
//! Entries are few, small, and refreshed wholesale, so this stays simple:
//! no eviction thread, no LRU, no partial invalidation. Expiry is evaluated
//! lazily on read against the caller's clock. Concurrent writers to the same
//! key race last-write-wins.

use scc::HashMap;
use std::collections::HashMap as StdHashMap;
use vendlink_api::{Category, Package, StoreInfo};

pub const KEY_INFORMATION: &str = "information";
pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_PACKAGES: &str = "packages";
pub const KEY_PACKAGE_SHORT_CODES: &str = "packageShortCodes";

/// A remote-fetched payload held by the cache.
///
/// `packageShortCodes` is always refreshed together with `packages`: the
/// index is recomputed from the package list on every refresh, never patched.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Information(StoreInfo),
    Categories(Vec<Category>),
    Packages(Vec<Package>),
    ShortCodes(StdHashMap<String, Package>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    expires_at: i64,
}

pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get a non-expired value. Expired entries read as absent; callers must
    /// never see data past its expiry.
    pub fn get(&self, key: &str, now: i64) -> Option<CacheValue> {
        self.entries
            .read_sync(key, |_, entry| {
                if now <= entry.expires_at {
                    Some(entry.value.clone())
                } else {
                    None
                }
            })
            .flatten()
    }

    /// Insert a value valid for `ttl_minutes` from `now`. Last write wins.
    pub fn set(&self, key: &str, value: CacheValue, ttl_minutes: i64, now: i64) {
        let entry = CacheEntry {
            value,
            expires_at: now + ttl_minutes * 60,
        };
        if self
            .entries
            .update_sync(key, |_, existing| *existing = entry.clone())
            .is_none()
        {
            let _ = self.entries.insert_sync(key.to_string(), entry);
        }
    }

    /// True iff an entry exists and has not expired.
    pub fn has_valid(&self, key: &str, now: i64) -> bool {
        self.entries
            .read_sync(key, |_, entry| now <= entry.expires_at)
            .unwrap_or(false)
    }

    pub fn remove(&self, key: &str) {
        let _ = self.entries.remove_sync(key);
    }

    pub fn clear(&self) {
        self.entries.clear_sync();
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendlink_api::{Category, Package};

    fn package(id: u64, order: i64) -> Package {
        Package {
            id,
            name: format!("Package {id}"),
            description: String::new(),
            price: 9.99,
            pay_frequency: None,
            order,
            category: None,
            sale: None,
        }
    }

    #[test]
    fn entry_is_valid_until_its_ttl_elapses() {
        let cache = TtlCache::new();
        let base = 1700000000;

        cache.set(KEY_PACKAGES, CacheValue::Packages(vec![package(1, 1)]), 30, base);

        // Valid immediately and at the expiry boundary
        assert!(cache.has_valid(KEY_PACKAGES, base));
        assert!(cache.has_valid(KEY_PACKAGES, base + 30 * 60));

        // Expired one second past the boundary; reads see nothing
        assert!(!cache.has_valid(KEY_PACKAGES, base + 30 * 60 + 1));
        assert!(cache.get(KEY_PACKAGES, base + 30 * 60 + 1).is_none());
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = TtlCache::new();
        let base = 1700000000;

        cache.set(KEY_CATEGORIES, CacheValue::Categories(Vec::new()), 30, base);
        cache.set(
            KEY_CATEGORIES,
            CacheValue::Categories(vec![Category {
                id: 1,
                name: "Ranks".to_string(),
                order: 1,
                packages: Vec::new(),
            }]),
            30,
            base + 10,
        );

        match cache.get(KEY_CATEGORIES, base + 10) {
            Some(CacheValue::Categories(categories)) => {
                assert_eq!(categories.len(), 1);
                assert_eq!(categories[0].name, "Ranks");
            }
            other => panic!("expected categories, got {other:?}"),
        }
    }

    #[test]
    fn remove_and_clear_drop_entries() {
        let cache = TtlCache::new();
        let base = 1700000000;

        cache.set(KEY_PACKAGES, CacheValue::Packages(Vec::new()), 30, base);
        cache.set(KEY_CATEGORIES, CacheValue::Categories(Vec::new()), 30, base);

        cache.remove(KEY_PACKAGES);
        assert!(!cache.has_valid(KEY_PACKAGES, base));
        assert!(cache.has_valid(KEY_CATEGORIES, base));

        cache.clear();
        assert!(!cache.has_valid(KEY_CATEGORIES, base));
    }
}
