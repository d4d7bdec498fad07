//! Report decoding and single-airport weather endpoints.
//!
//! - POST /api/v1/decode
//! - GET /api/v1/weather/:icao/metar
//! - GET /api/v1/weather/:icao/taf
//! - GET /api/v1/weather/:icao/notams

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{icao_param, AppState};
use crate::errors::{AppError, ErrorResponse};
use crate::models::{Notam, RawReport, ReportKind};
use crate::services::decoder::{decode, DecodedReport};
use crate::services::severity::{
    classify, classify_forecast, flight_category, FlightCategory, SeverityLevel, SeverityVerdict,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecodeRequest {
    /// Coded report text
    pub raw_text: String,
    /// "metar" or "taf"
    pub kind: ReportKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecodeResponse {
    pub decoded: DecodedReport,
    /// METAR: current conditions. TAF: worst of initial and change periods.
    pub severity: SeverityVerdict,
    pub flight_category: Option<FlightCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    pub raw: RawReport,
    pub decoded: DecodedReport,
    pub severity: SeverityVerdict,
    pub flight_category: Option<FlightCategory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotamResponse {
    pub airport: String,
    pub notams: Vec<Notam>,
    /// Highest severity among the NOTAMs ("normal" when there are none)
    pub worst_severity: SeverityLevel,
}

/// Decode and classify a report. TAFs are reduced over every period.
fn analyse(raw_text: &str, kind: ReportKind) -> Result<DecodeResponse, AppError> {
    let decoded = decode(raw_text, kind)?;
    let severity = match kind {
        ReportKind::Metar => classify(&decoded),
        ReportKind::Taf => classify_forecast(&decoded),
    };
    Ok(DecodeResponse {
        flight_category: flight_category(&decoded.conditions),
        decoded,
        severity,
    })
}

/// Decode a raw METAR or TAF.
#[utoipa::path(
    post,
    path = "/api/v1/decode",
    tag = "Weather",
    request_body = DecodeRequest,
    responses(
        (status = 200, description = "Decoded report with severity", body = DecodeResponse),
        (status = 422, description = "Report text does not match the grammar", body = ErrorResponse),
    )
)]
pub async fn decode_report(Json(body): Json<DecodeRequest>) -> Result<Json<DecodeResponse>, AppError> {
    Ok(Json(analyse(&body.raw_text, body.kind)?))
}

async fn airport_report(state: &AppState, kind: ReportKind, icao: &str) -> Result<WeatherResponse, AppError> {
    let icao = icao_param(icao)?;
    let raw = state.gateway.fetch(kind, &icao).await?;
    let analysed = analyse(&raw.raw_text, kind)?;
    Ok(WeatherResponse {
        raw,
        decoded: analysed.decoded,
        severity: analysed.severity,
        flight_category: analysed.flight_category,
    })
}

/// Latest METAR for an airport.
#[utoipa::path(
    get,
    path = "/api/v1/weather/{icao}/metar",
    tag = "Weather",
    params(("icao" = String, Path, description = "ICAO airport code")),
    responses(
        (status = 200, description = "Current observation", body = WeatherResponse),
        (status = 400, description = "Malformed ICAO code", body = ErrorResponse),
        (status = 422, description = "Report could not be decoded", body = ErrorResponse),
    )
)]
pub async fn get_metar(
    State(state): State<AppState>,
    Path(icao): Path<String>,
) -> Result<Json<WeatherResponse>, AppError> {
    Ok(Json(airport_report(&state, ReportKind::Metar, &icao).await?))
}

/// Latest TAF for an airport.
#[utoipa::path(
    get,
    path = "/api/v1/weather/{icao}/taf",
    tag = "Weather",
    params(("icao" = String, Path, description = "ICAO airport code")),
    responses(
        (status = 200, description = "Current forecast", body = WeatherResponse),
        (status = 400, description = "Malformed ICAO code", body = ErrorResponse),
        (status = 422, description = "Report could not be decoded", body = ErrorResponse),
    )
)]
pub async fn get_taf(
    State(state): State<AppState>,
    Path(icao): Path<String>,
) -> Result<Json<WeatherResponse>, AppError> {
    Ok(Json(airport_report(&state, ReportKind::Taf, &icao).await?))
}

/// NOTAMs for an airport.
#[utoipa::path(
    get,
    path = "/api/v1/weather/{icao}/notams",
    tag = "Weather",
    params(("icao" = String, Path, description = "ICAO airport code")),
    responses(
        (status = 200, description = "NOTAM list with per-NOTAM severity", body = NotamResponse),
        (status = 400, description = "Malformed ICAO code", body = ErrorResponse),
    )
)]
pub async fn get_notams(
    State(state): State<AppState>,
    Path(icao): Path<String>,
) -> Result<Json<NotamResponse>, AppError> {
    let icao = icao_param(&icao)?;
    let notams = state.gateway.fetch_notams(&icao).await?;
    let worst_severity = notams
        .iter()
        .map(|n| n.severity)
        .max()
        .unwrap_or(SeverityLevel::Normal);

    Ok(Json(NotamResponse {
        airport: icao,
        notams,
        worst_severity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::offline_state;

    #[tokio::test]
    async fn test_decode_endpoint_metar() {
        let Json(response) = decode_report(Json(DecodeRequest {
            raw_text: "METAR KJFK 121251Z 28014G20KT 10SM FEW250 24/18 A3000 RMK AO2 SLP158 T02440183="
                .to_string(),
            kind: ReportKind::Metar,
        }))
        .await
        .unwrap();
        assert_eq!(response.severity.level, SeverityLevel::Normal);
        assert_eq!(response.flight_category, Some(FlightCategory::Vfr));
        assert_eq!(response.decoded.station, "KJFK");
    }

    #[tokio::test]
    async fn test_decode_endpoint_rejects_garbage() {
        let err = decode_report(Json(DecodeRequest {
            raw_text: "hello world".to_string(),
            kind: ReportKind::Metar,
        }))
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[tokio::test]
    async fn test_metar_endpoint_uses_gateway() {
        let Json(response) = get_metar(State(offline_state()), Path("kjfk".to_string()))
            .await
            .unwrap();
        assert_eq!(response.raw.airport, "KJFK");
        assert_eq!(response.decoded.station, "KJFK");
    }

    #[tokio::test]
    async fn test_taf_endpoint_rejects_bad_code() {
        let err = get_taf(State(offline_state()), Path("JFK".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_notams_endpoint_worst_severity() {
        let Json(response) = get_notams(State(offline_state()), Path("KJFK".to_string()))
            .await
            .unwrap();
        assert_eq!(response.notams.len(), 2);
        assert_eq!(response.worst_severity, SeverityLevel::Caution);

        let Json(empty) = get_notams(State(offline_state()), Path("KSEA".to_string()))
            .await
            .unwrap();
        assert_eq!(empty.worst_severity, SeverityLevel::Normal);
    }
}
