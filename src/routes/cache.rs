use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::services::cache::{CacheStats, ReportCache};

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheClearResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Cache contents, for debugging.
#[utoipa::path(
    get,
    path = "/api/v1/cache/stats",
    tag = "Cache",
    responses(
        (status = 200, description = "Cache statistics", body = CacheStats),
    )
)]
pub async fn get_cache_stats(State(cache): State<Arc<ReportCache>>) -> Json<CacheStats> {
    Json(cache.stats().await)
}

/// Drop every cached entry.
#[utoipa::path(
    delete,
    path = "/api/v1/cache",
    tag = "Cache",
    responses(
        (status = 200, description = "Cache cleared", body = CacheClearResponse),
    )
)]
pub async fn clear_cache(State(cache): State<Arc<ReportCache>>) -> Json<CacheClearResponse> {
    Json(CacheClearResponse {
        removed: cache.clear().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{report_fingerprint, CachedPayload};
    use crate::services::providers::synthetic::SyntheticProvider;
    use crate::models::ReportKind;

    #[tokio::test]
    async fn test_stats_then_clear() {
        let cache = Arc::new(ReportCache::new(60));
        let report = SyntheticProvider::new().report(ReportKind::Metar, "KJFK");
        cache
            .put(&report_fingerprint(ReportKind::Metar, "KJFK"), CachedPayload::Report(report))
            .await;

        let Json(stats) = get_cache_stats(State(cache.clone())).await;
        assert_eq!(stats.count, 1);
        assert_eq!(stats.ttl_secs, 60);

        let Json(cleared) = clear_cache(State(cache.clone())).await;
        assert_eq!(cleared.removed, 1);
        let Json(stats) = get_cache_stats(State(cache)).await;
        assert_eq!(stats.count, 0);
    }
}
