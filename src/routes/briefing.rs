//! Route briefing endpoints.
//!
//! - POST /api/v1/briefing
//! - GET /api/v1/enroute?origin=&destination=&samples=&flight_level=

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use super::AppState;
use crate::errors::{AppError, ErrorResponse};
use crate::models::RoutePlan;
use crate::services::briefing::{Briefing, EnrouteReport};
use crate::services::geo::DEFAULT_ENROUTE_SAMPLES;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EnrouteQuery {
    /// Origin ICAO code
    pub origin: String,
    /// Destination ICAO code
    pub destination: String,
    /// Interior sample points (default 8, clamped to 2..=50)
    pub samples: Option<usize>,
    /// Cruise flight level, e.g. 350 for FL350
    pub flight_level: Option<u16>,
}

/// Build a pre-flight briefing for a route.
#[utoipa::path(
    post,
    path = "/api/v1/briefing",
    tag = "Briefing",
    request_body = RoutePlan,
    responses(
        (status = 200, description = "Complete route briefing", body = Briefing),
        (status = 400, description = "Route references an invalid or unknown airport", body = ErrorResponse),
    )
)]
pub async fn create_briefing(
    State(state): State<AppState>,
    Json(plan): Json<RoutePlan>,
) -> Result<Json<Briefing>, AppError> {
    Ok(Json(state.synthesizer.build(plan).await?))
}

/// Weather sampled along the great circle between two airports.
#[utoipa::path(
    get,
    path = "/api/v1/enroute",
    tag = "Briefing",
    params(EnrouteQuery),
    responses(
        (status = 200, description = "Enroute sample points", body = EnrouteReport),
        (status = 400, description = "Invalid or unknown airport", body = ErrorResponse),
    )
)]
pub async fn get_enroute(
    State(state): State<AppState>,
    Query(params): Query<EnrouteQuery>,
) -> Result<Json<EnrouteReport>, AppError> {
    let report = state
        .synthesizer
        .enroute(
            &params.origin,
            &params.destination,
            params.samples.unwrap_or(DEFAULT_ENROUTE_SAMPLES),
            params.flight_level,
        )
        .await?;
    Ok(Json(report))
}
