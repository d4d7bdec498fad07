use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::services::providers::gateway::{ProviderGateway, ProviderStatus};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when a real provider is usable, "degraded" when
    /// only synthetic data is available)
    pub status: String,
    /// API version
    pub version: String,
    /// Provider chain in priority order
    pub providers: Vec<ProviderStatus>,
}

/// Health check endpoint.
///
/// Always 200. Reports "degraded" when every provider is unconfigured or
/// disabled, so monitoring can tell live data from synthetic fallback.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(gateway): State<Arc<ProviderGateway>>) -> Json<HealthResponse> {
    let providers = gateway.provider_status();
    let live = providers.iter().any(|p| p.configured && !p.tripped);

    Json(HealthResponse {
        status: if live {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers,
    })
}
