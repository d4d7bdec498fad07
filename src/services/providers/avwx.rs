//! AVWX REST API client.
//!
//! Raw METAR/TAF, station metadata, nearest reports and NOTAMs.
//! See: https://avwx.docs.apiary.io

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{check_status, request_error, station_of, NearestReport, ProviderError, WeatherProvider};
use crate::models::{AirportRecord, Coordinate, Notam, ReportKind};
use crate::services::severity::classify_notam;

pub const AVWX_API_URL: &str = "https://avwx.rest";

/// Client for the AVWX API. Requires an API token.
#[derive(Debug, Clone)]
pub struct AvwxClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

// --- AVWX JSON response types ---

#[derive(Debug, Deserialize)]
struct AvwxReport {
    raw: Option<String>,
    station: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvwxStation {
    icao: Option<String>,
    iata: Option<String>,
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
    elevation_ft: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AvwxNotam {
    raw: String,
    number: Option<String>,
    start_time: Option<AvwxTimestamp>,
    end_time: Option<AvwxTimestamp>,
}

#[derive(Debug, Deserialize)]
struct AvwxTimestamp {
    dt: Option<DateTime<Utc>>,
}

impl AvwxClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("BEARER {}", self.api_key.as_deref().unwrap_or_default()),
            )
            .send()
            .await
            .map_err(request_error)?;

        check_status(response.status())?;

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("AVWX JSON parse error: {}", e)))
    }
}

fn raw_text_of(report: &AvwxReport) -> Result<String, ProviderError> {
    report
        .raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::NotFound)
}

fn notam_from_avwx(icao: &str, notam: AvwxNotam) -> Notam {
    let severity = classify_notam(&notam.raw);
    Notam {
        id: notam.number.unwrap_or_else(|| "UNKNOWN".to_string()),
        airport: icao.to_string(),
        effective_from: notam.start_time.and_then(|t| t.dt),
        effective_to: notam.end_time.and_then(|t| t.dt),
        text: notam.raw,
        severity,
    }
}

#[async_trait]
impl WeatherProvider for AvwxClient {
    fn name(&self) -> &'static str {
        "avwx"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_report(&self, kind: ReportKind, icao: &str) -> Result<String, ProviderError> {
        let report: AvwxReport = self
            .get_json(&format!("/api/{}/{}", kind.as_str(), icao))
            .await?;
        raw_text_of(&report)
    }

    async fn fetch_airport(&self, icao: &str) -> Result<AirportRecord, ProviderError> {
        let station: AvwxStation = self.get_json(&format!("/api/station/{}", icao)).await?;
        Ok(AirportRecord {
            icao: station
                .icao
                .unwrap_or_else(|| icao.to_string())
                .to_ascii_uppercase(),
            iata: station.iata.filter(|s| !s.is_empty()),
            name: station.name,
            country: station.country.unwrap_or_default(),
            latitude: station.latitude,
            longitude: station.longitude,
            elevation_ft: station.elevation_ft.map(|ft| ft.round() as i32),
        })
    }

    async fn fetch_nearest_report(
        &self,
        kind: ReportKind,
        point: Coordinate,
    ) -> Result<NearestReport, ProviderError> {
        let report: AvwxReport = self
            .get_json(&format!(
                "/api/{}/{:.4},{:.4}",
                kind.as_str(),
                point.latitude,
                point.longitude
            ))
            .await?;
        let raw_text = raw_text_of(&report)?;
        let station = report
            .station
            .filter(|s| crate::helpers::is_valid_icao(s))
            .or_else(|| station_of(&raw_text))
            .ok_or_else(|| ProviderError::InvalidResponse(format!("no station in '{}'", raw_text)))?;
        Ok(NearestReport {
            station,
            coordinate: None,
            raw_text,
        })
    }

    async fn fetch_notams(&self, icao: &str) -> Result<Vec<Notam>, ProviderError> {
        let notams: Vec<AvwxNotam> = self.get_json(&format!("/api/notam/{}", icao)).await?;
        Ok(notams
            .into_iter()
            .map(|n| notam_from_avwx(icao, n))
            .collect())
    }
}
