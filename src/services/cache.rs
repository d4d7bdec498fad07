//! In-memory report cache with lazy TTL expiry.
//!
//! Entries older than the TTL are treated as absent on lookup but stay in the
//! map until the same fingerprint is written again or the cache is cleared.
//! The lock is only held for the map operation itself, never across a
//! provider call.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::models::{AirportRecord, Notam, RawReport, ReportKind};

/// Default time-to-live for cached entries (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Anything the provider gateway caches.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Report(RawReport),
    Airport(AirportRecord),
    Notams(Vec<Notam>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedPayload,
    stored_at: DateTime<Utc>,
}

/// Snapshot returned by the cache introspection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CacheStats {
    /// Number of stored entries, including expired ones not yet overwritten
    pub count: usize,
    /// Stored fingerprints, sorted
    pub fingerprints: Vec<String>,
    /// Entries still within their TTL
    pub live: usize,
    /// Configured TTL in seconds
    pub ttl_secs: u64,
}

/// `{kind}_{ICAO}` for reports.
pub fn report_fingerprint(kind: ReportKind, icao: &str) -> String {
    format!("{}_{}", kind.as_str(), icao.to_ascii_uppercase())
}

/// `airport_{ICAO}` for airport metadata.
pub fn airport_fingerprint(icao: &str) -> String {
    format!("airport_{}", icao.to_ascii_uppercase())
}

/// `notam_{ICAO}` for NOTAM lists.
pub fn notam_fingerprint(icao: &str) -> String {
    format!("notam_{}", icao.to_ascii_uppercase())
}

#[derive(Debug)]
pub struct ReportCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ReportCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    pub async fn get(&self, fingerprint: &str) -> Option<CachedPayload> {
        self.get_at(fingerprint, Utc::now()).await
    }

    /// Lookup as of `now`; an entry aged `>= ttl` is absent.
    pub async fn get_at(&self, fingerprint: &str, now: DateTime<Utc>) -> Option<CachedPayload> {
        let entries = self.entries.read().await;
        let entry = entries.get(fingerprint)?;
        if now - entry.stored_at >= self.ttl {
            tracing::debug!("Cache entry '{}' expired", fingerprint);
            return None;
        }
        tracing::debug!("Cache hit for '{}'", fingerprint);
        Some(entry.payload.clone())
    }

    pub async fn put(&self, fingerprint: &str, payload: CachedPayload) {
        self.put_at(fingerprint, payload, Utc::now()).await;
    }

    pub async fn put_at(&self, fingerprint: &str, payload: CachedPayload, now: DateTime<Utc>) {
        self.entries.write().await.insert(
            fingerprint.to_string(),
            CacheEntry {
                payload,
                stored_at: now,
            },
        );
    }

    /// Remove every entry, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        tracing::info!("Cache cleared ({} entries)", removed);
        removed
    }

    pub async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.entries.read().await;
        let mut fingerprints: Vec<String> = entries.keys().cloned().collect();
        fingerprints.sort();
        let live = entries
            .values()
            .filter(|e| now - e.stored_at < self.ttl)
            .count();
        CacheStats {
            count: entries.len(),
            fingerprints,
            live,
            ttl_secs: self.ttl_secs(),
        }
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report(text: &str) -> CachedPayload {
        CachedPayload::Report(RawReport {
            airport: "KJFK".to_string(),
            kind: ReportKind::Metar,
            raw_text: text.to_string(),
            fetched_at: "2026-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            source: "test".to_string(),
        })
    }

    #[test]
    fn test_fingerprints() {
        assert_eq!(report_fingerprint(ReportKind::Metar, "kjfk"), "metar_KJFK");
        assert_eq!(report_fingerprint(ReportKind::Taf, "EGLL"), "taf_EGLL");
        assert_eq!(airport_fingerprint("klax"), "airport_KLAX");
        assert_eq!(notam_fingerprint("KORD"), "notam_KORD");
    }

    #[tokio::test]
    async fn test_entry_visible_before_ttl_absent_at_ttl() {
        let cache = ReportCache::new(300);
        let t = "2026-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        cache.put_at("metar_KJFK", sample_report("A"), t).await;

        let just_before = t + Duration::seconds(299);
        assert_eq!(
            cache.get_at("metar_KJFK", just_before).await,
            Some(sample_report("A"))
        );
        assert_eq!(cache.get_at("metar_KJFK", t + Duration::seconds(300)).await, None);
        assert_eq!(cache.get_at("metar_KJFK", t + Duration::hours(2)).await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_evicted_but_overwritten() {
        let cache = ReportCache::new(60);
        let t = "2026-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        cache.put_at("metar_KJFK", sample_report("old"), t).await;

        let later = t + Duration::seconds(120);
        assert_eq!(cache.get_at("metar_KJFK", later).await, None);
        // Still stored (lazy expiry)
        assert_eq!(cache.entries.read().await.len(), 1);

        cache.put_at("metar_KJFK", sample_report("new"), later).await;
        assert_eq!(
            cache.get_at("metar_KJFK", later).await,
            Some(sample_report("new"))
        );
        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache = ReportCache::default();
        assert_eq!(tokio_test::block_on(cache.get("metar_EGLL")), None);
        assert_eq!(cache.ttl_secs(), DEFAULT_CACHE_TTL_SECS);
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let cache = ReportCache::new(300);
        cache.put("taf_KJFK", sample_report("B")).await;
        cache.put("metar_KJFK", sample_report("A")).await;
        let old = Utc::now() - Duration::hours(1);
        cache.put_at("metar_EGLL", sample_report("C"), old).await;

        let stats = cache.stats().await;
        assert_eq!(stats.count, 3);
        assert_eq!(stats.live, 2);
        assert_eq!(
            stats.fingerprints,
            vec!["metar_EGLL", "metar_KJFK", "taf_KJFK"]
        );

        assert_eq!(cache.clear().await, 3);
        assert_eq!(cache.stats().await.count, 0);
    }
}
