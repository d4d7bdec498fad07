//! AviationWeather.gov Data API client.
//!
//! Free public source, no credentials. Raw reports come back as plain text,
//! station info as JSON, and bounding-box searches as XML.
//! See: https://aviationweather.gov/data/api/

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use super::{check_status, request_error, NearestReport, ProviderError, WeatherProvider};
use crate::helpers::meters_to_feet;
use crate::models::{AirportRecord, Coordinate, ReportKind};
use crate::services::geo::distance_nm;

pub const AWC_API_URL: &str = "https://aviationweather.gov";

/// Half-widths (degrees) of the boxes searched for a nearest station, in order.
const NEAREST_SEARCH_DEGREES: [f64; 2] = [1.0, 3.0];

/// Client for the AviationWeather.gov Data API.
#[derive(Debug, Clone)]
pub struct AwcClient {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AwcStation {
    icao_id: Option<String>,
    iata_id: Option<String>,
    site: Option<String>,
    country: Option<String>,
    lat: f64,
    lon: f64,
    /// Elevation in meters
    elev: Option<f64>,
}

/// One report entry from an XML bounding-box response.
#[derive(Debug, Clone, Default, PartialEq)]
struct XmlReport {
    raw_text: String,
    station_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl AwcClient {
    pub fn new(client: reqwest::Client, base_url: &str, enabled: bool) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled,
        }
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(request_error)?;

        // AWC answers 204 No Content for unknown stations
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Err(ProviderError::NotFound);
        }
        check_status(response.status())?;

        response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("AWC body read error: {}", e)))
    }
}

/// Parse the `<METAR>`/`<TAF>` entries of an AWC XML response.
fn parse_xml_reports(xml: &str, kind: ReportKind) -> Result<Vec<XmlReport>, ProviderError> {
    let entry_tag: &[u8] = match kind {
        ReportKind::Metar => b"METAR",
        ReportKind::Taf => b"TAF",
    };

    let mut reader = Reader::from_str(xml);
    let mut reports = Vec::new();
    let mut current: Option<XmlReport> = None;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                if name.as_ref() == entry_tag {
                    current = Some(XmlReport::default());
                } else if current.is_some() {
                    current_element = Some(String::from_utf8_lossy(name.as_ref()).into_owned());
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(report), Some(elem)) = (current.as_mut(), current_element.as_deref()) {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    match elem {
                        "raw_text" => report.raw_text = text,
                        "station_id" => report.station_id = text,
                        "latitude" => report.latitude = text.parse().ok(),
                        "longitude" => report.longitude = text.parse().ok(),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == entry_tag {
                    if let Some(report) = current.take() {
                        if !report.raw_text.is_empty() && !report.station_id.is_empty() {
                            reports.push(report);
                        }
                    }
                }
                current_element = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProviderError::InvalidResponse(format!(
                    "AWC XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(reports)
}

/// The report closest to `point` that carries a position.
fn closest_report(reports: Vec<XmlReport>, point: Coordinate) -> Option<(XmlReport, Coordinate)> {
    reports
        .into_iter()
        .filter_map(|r| {
            let coordinate = Coordinate {
                latitude: r.latitude?,
                longitude: r.longitude?,
            };
            Some((r, coordinate))
        })
        .min_by(|a, b| distance_nm(point, a.1).total_cmp(&distance_nm(point, b.1)))
}

#[async_trait]
impl WeatherProvider for AwcClient {
    fn name(&self) -> &'static str {
        "aviationweather"
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }

    async fn fetch_report(&self, kind: ReportKind, icao: &str) -> Result<String, ProviderError> {
        let body = self
            .get_text(
                &format!("/api/data/{}", kind.as_str()),
                &[("ids", icao.to_string()), ("format", "raw".to_string())],
            )
            .await?;

        // Several reports may be returned; the newest comes first
        let raw = match kind {
            ReportKind::Metar => body.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string),
            // TAF change groups are wrapped onto indented lines
            ReportKind::Taf => body
                .split("\n\n")
                .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
                .find(|block| !block.is_empty()),
        };
        raw.ok_or(ProviderError::NotFound)
    }

    async fn fetch_airport(&self, icao: &str) -> Result<AirportRecord, ProviderError> {
        let body = self
            .get_text(
                "/api/data/stationinfo",
                &[("ids", icao.to_string()), ("format", "json".to_string())],
            )
            .await?;
        let stations: Vec<AwcStation> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("AWC JSON parse error: {}", e)))?;
        let station = stations.into_iter().next().ok_or(ProviderError::NotFound)?;

        Ok(AirportRecord {
            icao: station
                .icao_id
                .unwrap_or_else(|| icao.to_string())
                .to_ascii_uppercase(),
            iata: station.iata_id.filter(|s| !s.is_empty() && s != "-"),
            name: station.site.unwrap_or_else(|| icao.to_string()),
            country: station.country.unwrap_or_default(),
            latitude: station.lat,
            longitude: station.lon,
            elevation_ft: station.elev.map(|m| meters_to_feet(m).round() as i32),
        })
    }

    async fn fetch_nearest_report(
        &self,
        kind: ReportKind,
        point: Coordinate,
    ) -> Result<NearestReport, ProviderError> {
        for half_width in NEAREST_SEARCH_DEGREES {
            let bbox = format!(
                "{:.2},{:.2},{:.2},{:.2}",
                point.latitude - half_width,
                point.longitude - half_width,
                point.latitude + half_width,
                point.longitude + half_width
            );
            let body = match self
                .get_text(
                    &format!("/api/data/{}", kind.as_str()),
                    &[("bbox", bbox), ("format", "xml".to_string())],
                )
                .await
            {
                Ok(body) => body,
                Err(ProviderError::NotFound) => continue,
                Err(e) => return Err(e),
            };

            if let Some((report, coordinate)) = closest_report(parse_xml_reports(&body, kind)?, point) {
                return Ok(NearestReport {
                    station: report.station_id,
                    coordinate: Some(coordinate),
                    raw_text: report.raw_text,
                });
            }
        }
        Err(ProviderError::NotFound)
    }
}
