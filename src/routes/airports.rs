use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{icao_param, AppState};
use crate::errors::{AppError, ErrorResponse};
use crate::models::AirportRecord;
use crate::services::airports::{self, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AirportSearchQuery {
    /// ICAO/IATA code, airport name or city
    pub q: String,
    /// Maximum number of results (default 10, max 50)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AirportSearchResponse {
    pub query: String,
    /// Exact code matches first, then name/city prefix, then substring
    pub results: Vec<AirportRecord>,
}

/// Airport metadata by ICAO code.
#[utoipa::path(
    get,
    path = "/api/v1/airports/{icao}",
    tag = "Airports",
    params(("icao" = String, Path, description = "ICAO airport code")),
    responses(
        (status = 200, description = "Airport metadata", body = AirportRecord),
        (status = 400, description = "Malformed ICAO code", body = ErrorResponse),
        (status = 404, description = "Unknown airport", body = ErrorResponse),
    )
)]
pub async fn get_airport(
    State(state): State<AppState>,
    Path(icao): Path<String>,
) -> Result<Json<AirportRecord>, AppError> {
    let icao = icao_param(&icao)?;
    Ok(Json(state.gateway.fetch_airport(&icao).await?))
}

/// Search the built-in airport table.
#[utoipa::path(
    get,
    path = "/api/v1/airports/search",
    tag = "Airports",
    params(AirportSearchQuery),
    responses(
        (status = 200, description = "Matching airports", body = AirportSearchResponse),
        (status = 400, description = "Empty query", body = ErrorResponse),
    )
)]
pub async fn search_airports(
    Query(params): Query<AirportSearchQuery>,
) -> Result<Json<AirportSearchResponse>, AppError> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Err(AppError::BadRequest("Query 'q' must not be empty".to_string()));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    Ok(Json(AirportSearchResponse {
        results: airports::search(&query, limit),
        query,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::offline_state;

    #[tokio::test]
    async fn test_get_airport_known_and_unknown() {
        let Json(airport) = get_airport(State(offline_state()), Path("lszh".to_string()))
            .await
            .unwrap();
        assert_eq!(airport.icao, "LSZH");

        let err = get_airport(State(offline_state()), Path("ZZZZ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let Json(response) = search_airports(Query(AirportSearchQuery {
            q: "international".to_string(),
            limit: Some(2),
        }))
        .await
        .unwrap();
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let err = search_airports(Query(AirportSearchQuery {
            q: "  ".to_string(),
            limit: None,
        }))
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
