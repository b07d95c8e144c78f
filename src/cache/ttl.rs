//! TTL cache persisted as a single JSON map
//!
//! The whole map lives in the store under [`StoreKey::Cache`] and is rewritten
//! on every change. Storage failures never reach callers: a broken store
//! behaves like an empty cache. Entries are decoded one by one; an entry that
//! does not decode is skipped and dropped on the next write, while the other
//! entries survive.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{Store, StoreKey};

/// A single cached value with its expiry metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    pub data: serde_json::Value,
    /// Write time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Time-to-live in milliseconds
    pub ttl: u64,
}

impl CacheEntry {
    /// An entry is stale once strictly more than `ttl` has passed since it was written
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.timestamp_millis() - self.timestamp;
        age > 0 && age as u64 > self.ttl
    }
}

type CacheMap = BTreeMap<String, CacheEntry>;

/// Expiring key-value cache
#[derive(Debug, Clone)]
pub struct TtlCache {
    store: Store,
}

impl TtlCache {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Loads the map; `None` when the stored map is unreadable
    fn load_map(&self) -> Option<CacheMap> {
        let raw = match self
            .store
            .load_json::<BTreeMap<String, serde_json::Value>>(StoreKey::Cache)
        {
            Ok(raw) => raw.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "cache map unreadable");
                return None;
            }
        };
        let map = raw
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value(value) {
                Ok(entry) => Some((key, entry)),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping malformed cache entry");
                    None
                }
            })
            .collect();
        Some(map)
    }

    fn save_map(&self, map: &CacheMap) -> bool {
        match self.store.save_json(StoreKey::Cache, map) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist cache map");
                false
            }
        }
    }

    /// Stores `value` under `key` with the given time-to-live
    ///
    /// Overwrites any previous entry. Returns false if the value could not be
    /// serialized or the map could not be written.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        self.put_at(key, value, ttl, Utc::now())
    }

    /// [`put`](Self::put) with an explicit clock
    pub fn put_at<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "cache value not serializable");
                return false;
            }
        };

        // An unreadable map is replaced rather than blocking new writes
        let mut map = self.load_map().unwrap_or_default();
        map.insert(
            key.to_string(),
            CacheEntry {
                data,
                timestamp: now.timestamp_millis(),
                ttl: ttl.as_millis().min(u64::MAX as u128) as u64,
            },
        );
        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache put");
        self.save_map(&map)
    }

    /// Returns the value under `key` if it exists and has not expired
    ///
    /// An expired entry is deleted from the stored map as a side effect.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// [`get`](Self::get) with an explicit clock
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let mut map = self.load_map()?;
        let entry = map.get(key)?;

        if entry.is_expired_at(now) {
            debug!(key, "cache entry expired, evicting");
            map.remove(key);
            self.save_map(&map);
            return None;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Keys currently in the stored map, expired ones included
    pub fn keys(&self) -> Vec<String> {
        self.load_map()
            .map(|map| map.into_keys().collect())
            .unwrap_or_default()
    }

    /// Removes every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    /// [`purge_expired`](Self::purge_expired) with an explicit clock
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let Some(mut map) = self.load_map() else {
            return 0;
        };
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - map.len();
        if removed > 0 && !self.save_map(&map) {
            return 0;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (TtlCache, Store, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::new(temp_dir.path().to_path_buf());
        (TtlCache::new(store.clone()), store, temp_dir)
    }

    fn sample() -> TestData {
        TestData {
            name: "kyiv".to_string(),
            value: 21,
        }
    }

    #[test]
    fn test_put_then_get_within_ttl_returns_value() {
        let (cache, _store, _temp_dir) = create_test_cache();

        assert!(cache.put("weather_Kyiv", &sample(), Duration::from_secs(600)));
        let cached: Option<TestData> = cache.get("weather_Kyiv");

        assert_eq!(cached, Some(sample()));
    }

    #[test]
    fn test_get_unknown_key_returns_none() {
        let (cache, _store, _temp_dir) = create_test_cache();
        assert_eq!(cache.get::<TestData>("missing"), None);

        cache.put("present", &1, Duration::from_secs(60));
        assert_eq!(cache.get::<i32>("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let (cache, store, _temp_dir) = create_test_cache();
        let written = Utc::now();
        cache.put_at("weather_Lviv", &sample(), Duration::from_secs(600), written);
        cache.put_at("other", &5, Duration::from_secs(600), written);

        let later = written + ChronoDuration::seconds(601);
        assert_eq!(cache.get_at::<TestData>("weather_Lviv", later), None);

        let raw: CacheMap = store.load_json(StoreKey::Cache).unwrap().unwrap();
        assert!(!raw.contains_key("weather_Lviv"));
        assert!(raw.contains_key("other"));
    }

    #[test]
    fn test_entry_at_exact_ttl_is_still_fresh() {
        let (cache, _store, _temp_dir) = create_test_cache();
        let written = Utc::now();
        cache.put_at("k", &sample(), Duration::from_secs(10), written);

        let boundary = written + ChronoDuration::seconds(10);
        assert_eq!(cache.get_at::<TestData>("k", boundary), Some(sample()));
        let past = boundary + ChronoDuration::milliseconds(1);
        assert_eq!(cache.get_at::<TestData>("k", past), None);
    }

    #[test]
    fn test_expired_entries_linger_until_read() {
        let (cache, _store, _temp_dir) = create_test_cache();
        let written = Utc::now() - ChronoDuration::hours(2);
        cache.put_at("stale", &1, Duration::from_secs(60), written);

        assert_eq!(cache.keys(), vec!["stale".to_string()]);
    }

    #[test]
    fn test_put_overwrites_and_restamps() {
        let (cache, store, _temp_dir) = create_test_cache();
        let old = Utc::now() - ChronoDuration::hours(1);
        cache.put_at("k", &1, Duration::from_secs(60), old);
        cache.put("k", &2, Duration::from_secs(60));

        assert_eq!(cache.get::<i32>("k"), Some(2));
        let raw: CacheMap = store.load_json(StoreKey::Cache).unwrap().unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw["k"].timestamp > old.timestamp_millis());
        assert_eq!(raw["k"].ttl, 60_000);
    }

    #[test]
    fn test_stored_format() {
        let (cache, _store, temp_dir) = create_test_cache();
        cache.put("weather_Odesa", &sample(), Duration::from_millis(600_000));

        let content = fs::read_to_string(temp_dir.path().join("travel_cache.json")).unwrap();
        assert!(content.contains("\"weather_Odesa\""));
        assert!(content.contains("\"data\""));
        assert!(content.contains("\"timestamp\""));
        assert!(content.contains("\"ttl\":600000"));
    }

    #[test]
    fn test_malformed_store_behaves_like_empty_cache() {
        let (cache, store, _temp_dir) = create_test_cache();
        store.write_raw(StoreKey::Cache, "definitely not json").unwrap();

        assert_eq!(cache.get::<i32>("k"), None);
        assert!(cache.keys().is_empty());
        assert_eq!(cache.purge_expired(), 0);

        // A write replaces the broken map
        assert!(cache.put("k", &3, Duration::from_secs(60)));
        assert_eq!(cache.get::<i32>("k"), Some(3));
    }

    #[test]
    fn test_malformed_entry_does_not_drop_others() {
        let (cache, store, _temp_dir) = create_test_cache();
        let now = Utc::now().timestamp_millis();
        store
            .write_raw(
                StoreKey::Cache,
                &format!(
                    r#"{{"good": {{"data": 1, "timestamp": {}, "ttl": 600000}}, "bad": {{"data": 2}}}}"#,
                    now
                ),
            )
            .unwrap();

        assert_eq!(cache.get::<i32>("good"), Some(1));
        assert_eq!(cache.get::<i32>("bad"), None);
        assert_eq!(cache.keys(), vec!["good".to_string()]);

        assert!(cache.put("new", &3, Duration::from_secs(60)));
        assert_eq!(cache.get::<i32>("good"), Some(1));
        assert_eq!(cache.keys(), vec!["good".to_string(), "new".to_string()]);
    }

    #[test]
    fn test_unavailable_store_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let cache = TtlCache::new(Store::new(blocker));

        assert!(!cache.put("k", &1, Duration::from_secs(60)));
        assert_eq!(cache.get::<i32>("k"), None);
    }

    #[test]
    fn test_wrong_type_returns_none_without_evicting() {
        let (cache, _store, _temp_dir) = create_test_cache();
        cache.put("k", &"text", Duration::from_secs(60));

        assert_eq!(cache.get::<i32>("k"), None);
        assert_eq!(cache.get::<String>("k"), Some("text".to_string()));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, _store, _temp_dir) = create_test_cache();
        let now = Utc::now();
        cache.put_at("a", &1, Duration::from_secs(10), now - ChronoDuration::seconds(60));
        cache.put_at("b", &2, Duration::from_secs(10), now - ChronoDuration::seconds(30));
        cache.put_at("c", &3, Duration::from_secs(600), now);

        assert_eq!(cache.purge_expired_at(now), 2);
        assert_eq!(cache.keys(), vec!["c".to_string()]);
        assert_eq!(cache.purge_expired_at(now), 0);
    }
}
