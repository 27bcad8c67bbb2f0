//! In-process [`Cache`] with entries expiring after a TTL.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use common::{Clock, DateTime, SystemClock};

/// In-process key-value cache, which entries expire after a TTL.
///
/// Expiry is measured with the injected [`Clock`], so it's fully controllable
/// in tests.
pub struct Cache<K, V, C = SystemClock> {
    /// Time-to-live of the [`Cache`] entries.
    ttl: Duration,

    /// [`Clock`] measuring the entries age.
    clock: C,

    /// Cached entries along with their expiration [`DateTime`].
    entries: Mutex<HashMap<K, (V, DateTime)>>,
}

impl<K, V, C> fmt::Debug for Cache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V> {
    /// Creates a new empty [`Cache`] measuring TTL by the [`SystemClock`].
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> Cache<K, V, C> {
    /// Creates a new empty [`Cache`] measuring TTL by the provided [`Clock`].
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    /// Returns the value stored under the provided `key`, unless it expired.
    ///
    /// Expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some((value, expires_at)) if now < *expires_at => {
                Some(value.clone())
            }
            Some(_) => {
                _ = entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores the provided `value` under the provided `key` for the TTL of
    /// this [`Cache`], replacing the previous one.
    pub fn set(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        entries.retain(|_, (_, expires_at)| now < *expires_at);
        _ = entries.insert(key, (value, now + self.ttl));
    }

    /// Removes the value stored under the provided `key`, if any.
    pub fn evict(&self, key: &K) {
        _ = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod spec {
    use std::{sync::Mutex, time::Duration};

    use common::{Clock, DateTime};

    use super::Cache;

    /// [`Clock`] moved forward manually.
    #[derive(Debug)]
    struct ManualClock(Mutex<DateTime>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for &ManualClock {
        fn now(&self) -> DateTime {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn expires_after_ttl() {
        let clock = ManualClock(Mutex::new(DateTime::UNIX_EPOCH));
        let cache = Cache::with_clock(Duration::from_secs(60), &clock);

        cache.set("pro", 1);
        assert_eq!(cache.get(&"pro"), Some(1));

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"pro"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"pro"), None);
    }

    #[test]
    fn set_refreshes_ttl() {
        let clock = ManualClock(Mutex::new(DateTime::UNIX_EPOCH));
        let cache = Cache::with_clock(Duration::from_secs(60), &clock);

        cache.set("pro", 1);
        clock.advance(Duration::from_secs(50));
        cache.set("pro", 2);
        clock.advance(Duration::from_secs(50));

        assert_eq!(cache.get(&"pro"), Some(2));
    }

    #[test]
    fn evicts() {
        let clock = ManualClock(Mutex::new(DateTime::UNIX_EPOCH));
        let cache = Cache::with_clock(Duration::from_secs(60), &clock);

        cache.set("pro", 1);
        cache.evict(&"pro");
        assert_eq!(cache.get(&"pro"), None);

        cache.evict(&"unknown");
    }
}
