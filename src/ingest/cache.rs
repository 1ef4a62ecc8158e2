// src/ingest/cache.rs
//! TTL cache for resolutions, keyed by `(SignalKind, EntityKey)`.
//!
//! The whole `Resolution` is stored so a hit replays the same attempt log
//! and the evaluation output does not depend on whether the cache answered.
//! Only provider-sourced (non-fallback) resolutions are stored. Expired
//! entries behave like a miss; they are evicted on access and swept on every
//! insert, so the map never outgrows the set of keys seen within one TTL.

use crate::entity::EntityKey;
use crate::ingest::resolver::Resolution;
use crate::signal::SignalKind;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

type Key = (SignalKind, EntityKey);

#[derive(Debug)]
struct Entry {
    resolution: Resolution,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct SignalCache {
    ttl: Duration,
    entries: Mutex<HashMap<Key, Entry>>,
}

impl SignalCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Key, Entry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, kind: SignalKind, key: &EntityKey) -> Option<Resolution> {
        self.get_at(kind, key, Instant::now())
    }

    fn get_at(&self, kind: SignalKind, key: &EntityKey, now: Instant) -> Option<Resolution> {
        let mut map = self.lock();
        let k = (kind, key.clone());
        let fresh = map
            .get(&k)
            .map(|e| now.saturating_duration_since(e.stored_at) < self.ttl)?;
        if fresh {
            map.get(&k).map(|e| e.resolution.clone())
        } else {
            map.remove(&k);
            None
        }
    }

    /// Stores a provider-sourced resolution; defaults are ignored.
    pub fn put(&self, key: &EntityKey, resolution: &Resolution) {
        self.put_at(key, resolution, Instant::now());
    }

    fn put_at(&self, key: &EntityKey, resolution: &Resolution, now: Instant) {
        if resolution.signal.is_fallback {
            return;
        }
        let ttl = self.ttl;
        let mut map = self.lock();
        map.retain(|_, e| now.saturating_duration_since(e.stored_at) < ttl);
        map.insert(
            (resolution.kind, key.clone()),
            Entry {
                resolution: resolution.clone(),
                stored_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::FixedProvider;
    use crate::ingest::{resolve, ProviderChain, QualityGate};
    use crate::signal::{SignalPayload, TrendSnapshot};

    async fn mk_trend(key: &EntityKey) -> Resolution {
        let chain = ProviderChain::new(SignalKind::Trend, Duration::from_millis(100)).with(
            FixedProvider::ok(
                "datalab",
                SignalPayload::Trend(TrendSnapshot {
                    change_pct: 3.0,
                    ratio: None,
                }),
                10,
            ),
        );
        resolve(SignalKind::Trend, key, &chain, &QualityGate::default()).await
    }

    #[tokio::test]
    async fn hit_replays_resolution_and_is_keyed_by_kind() {
        let c = SignalCache::new(Duration::from_secs(60));
        let k = EntityKey::new("현대", "그랜저", "가솔린");
        let r = mk_trend(&k).await;
        c.put(&k, &r);

        let hit = c.get(SignalKind::Trend, &k).unwrap();
        assert_eq!(hit, r);
        assert_eq!(hit.notes(), r.notes());
        assert_eq!(c.get(SignalKind::Macro, &k), None);
        assert_eq!(c.get(SignalKind::Trend, &EntityKey::new("현대", "그랜저", "LPG")), None);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_evicted() {
        let c = SignalCache::new(Duration::from_secs(60));
        let k = EntityKey::new("기아", "K5", "가솔린");
        c.put(&k, &mk_trend(&k).await);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(c.get_at(SignalKind::Trend, &k, later), None);
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn insert_sweeps_expired_entries() {
        let c = SignalCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        let r = mk_trend(&EntityKey::new("기아", "K5", "가솔린")).await;
        for i in 0..50 {
            c.put_at(&EntityKey::new("브랜드", format!("모델{i}"), "가솔린"), &r, t0);
        }
        assert_eq!(c.len(), 50);

        let later = t0 + Duration::from_secs(61);
        c.put_at(&EntityKey::new("현대", "그랜저", "가솔린"), &r, later);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn fallback_resolutions_are_not_cached() {
        let c = SignalCache::new(Duration::from_secs(60));
        let k = EntityKey::new("기아", "K5", "가솔린");
        c.put(&k, &Resolution::deadline_exceeded(SignalKind::Trend));
        assert!(c.is_empty());
    }
}
