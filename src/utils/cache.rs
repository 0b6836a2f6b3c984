use chrono::{DateTime, Utc};
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

use super::clock::SharedClock;

struct Entry<V> {
    value:    V,
    inserted: DateTime<Utc>,
}

/// String-keyed map whose entries expire `ttl` after insertion.
///
/// Each write replaces the whole entry, so readers never see a half-updated
/// value. Expired entries are dropped on the read that notices them.
pub struct TtlCache<V> {
    map:   RwLock<HashMap<String, Entry<V>>>,
    ttl:   Duration,
    clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self { map: RwLock::default(), ttl, clock }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let m = self.map.read().await;
            match m.get(key) {
                None => return None,
                Some(e) if self.fresh(e.inserted, now) => return Some(e.value.clone()),
                Some(_) => {}
            }
        }
        // stale: only remove if nobody refreshed it in between
        let mut m = self.map.write().await;
        if m.get(key).is_some_and(|e| !self.fresh(e.inserted, now)) {
            m.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, self.clock.now()).await;
    }

    /// Insert a value captured earlier; it ages from `inserted`, not from now.
    pub async fn insert_at(&self, key: impl Into<String>, value: V, inserted: DateTime<Utc>) {
        let entry = Entry { value, inserted };
        self.map.write().await.insert(key.into(), entry);
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.map.write().await.remove(key).map(|e| e.value)
    }

    pub async fn len(&self) -> usize { self.map.read().await.len() }

    fn fresh(&self, inserted: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // a clock that went backwards counts as age zero
        let age = (now - inserted).to_std().unwrap_or_default();
        age < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::{Clock, ManualClock};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, TtlCache<u32>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let cache = TtlCache::new(Duration::from_secs(300), clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn hit_inside_window() {
        let (clock, cache) = setup();
        cache.insert("elmune", 7).await;
        clock.advance(chrono::Duration::seconds(299));
        assert_eq!(cache.get("elmune").await, Some(7));
    }

    #[tokio::test]
    async fn expired_entry_is_dropped() {
        let (clock, cache) = setup();
        cache.insert("elmune", 7).await;
        clock.advance(chrono::Duration::seconds(300));
        assert_eq!(cache.get("elmune").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn backdated_entry_keeps_its_capture_time() {
        let (clock, cache) = setup();
        let captured = clock.now() - chrono::Duration::seconds(250);
        cache.insert_at("late", 9, captured).await;
        assert_eq!(cache.get("late").await, Some(9));
        clock.advance(chrono::Duration::seconds(50));
        assert_eq!(cache.get("late").await, None);
    }

    #[tokio::test]
    async fn insert_restarts_the_window() {
        let (clock, cache) = setup();
        cache.insert("a", 1).await;
        clock.advance(chrono::Duration::seconds(200));
        cache.insert("a", 2).await;
        clock.advance(chrono::Duration::seconds(200));
        assert_eq!(cache.get("a").await, Some(2));
        assert_eq!(cache.remove("a").await, Some(2));
        assert_eq!(cache.get("a").await, None);
    }
}
