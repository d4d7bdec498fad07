//! CheckWX API client.
//!
//! Raw METAR/TAF, station metadata and nearest-station reports.
//! See: https://www.checkwxapi.com/documentation

use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, request_error, station_of, NearestReport, ProviderError, WeatherProvider};
use crate::models::{AirportRecord, Coordinate, ReportKind};

pub const CHECKWX_API_URL: &str = "https://api.checkwx.com";

/// Client for the CheckWX API. Requires an API key.
#[derive(Debug, Clone)]
pub struct CheckWxClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

// --- CheckWX JSON response types ---

#[derive(Debug, Deserialize)]
struct CheckWxResponse<T> {
    results: u32,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CheckWxStation {
    icao: String,
    iata: Option<String>,
    name: String,
    country: Option<CheckWxCountry>,
    latitude: Option<CheckWxDecimal>,
    longitude: Option<CheckWxDecimal>,
    elevation: Option<CheckWxElevation>,
}

#[derive(Debug, Deserialize)]
struct CheckWxCountry {
    code: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckWxDecimal {
    decimal: f64,
}

#[derive(Debug, Deserialize)]
struct CheckWxElevation {
    feet: Option<f64>,
}

impl CheckWxClient {
    pub fn new(client: reqwest::Client, api_key: Option<String>, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<CheckWxResponse<T>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", self.api_key.as_deref().unwrap_or_default())
            .send()
            .await
            .map_err(request_error)?;

        check_status(response.status())?;

        response
            .json::<CheckWxResponse<T>>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("CheckWX JSON parse error: {}", e)))
    }
}

/// First non-empty raw report in a CheckWX response.
fn first_raw_report(response: CheckWxResponse<String>) -> Result<String, ProviderError> {
    if response.results == 0 {
        return Err(ProviderError::NotFound);
    }
    response
        .data
        .into_iter()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .ok_or(ProviderError::NotFound)
}

fn station_to_record(station: CheckWxStation) -> Result<AirportRecord, ProviderError> {
    let (Some(lat), Some(lon)) = (station.latitude, station.longitude) else {
        return Err(ProviderError::InvalidResponse(format!(
            "CheckWX station {} has no coordinates",
            station.icao
        )));
    };
    Ok(AirportRecord {
        icao: station.icao.to_ascii_uppercase(),
        iata: station.iata.filter(|s| !s.is_empty()),
        name: station.name,
        country: station
            .country
            .and_then(|c| c.code.or(c.name))
            .unwrap_or_default(),
        latitude: lat.decimal,
        longitude: lon.decimal,
        elevation_ft: station
            .elevation
            .and_then(|e| e.feet)
            .map(|ft| ft.round() as i32),
    })
}

#[async_trait]
impl WeatherProvider for CheckWxClient {
    fn name(&self) -> &'static str {
        "checkwx"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_report(&self, kind: ReportKind, icao: &str) -> Result<String, ProviderError> {
        let response = self
            .get_json::<String>(&format!("/{}/{}", kind.as_str(), icao))
            .await?;
        first_raw_report(response)
    }

    async fn fetch_airport(&self, icao: &str) -> Result<AirportRecord, ProviderError> {
        let response = self
            .get_json::<CheckWxStation>(&format!("/station/{}", icao))
            .await?;
        let station = response
            .data
            .into_iter()
            .next()
            .ok_or(ProviderError::NotFound)?;
        station_to_record(station)
    }

    async fn fetch_nearest_report(
        &self,
        kind: ReportKind,
        point: Coordinate,
    ) -> Result<NearestReport, ProviderError> {
        let response = self
            .get_json::<String>(&format!(
                "/{}/lat/{:.4}/lon/{:.4}",
                kind.as_str(),
                point.latitude,
                point.longitude
            ))
            .await?;
        let raw_text = first_raw_report(response)?;
        let station = station_of(&raw_text).ok_or_else(|| {
            ProviderError::InvalidResponse(format!("no station in '{}'", raw_text))
        })?;
        Ok(NearestReport {
            station,
            coordinate: None,
            raw_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> CheckWxClient {
        CheckWxClient::new(reqwest::Client::new(), key.map(str::to_string), &server.uri())
    }

    #[test]
    fn test_unconfigured_without_key() {
        let client = CheckWxClient::new(reqwest::Client::new(), Some("  ".to_string()), CHECKWX_API_URL);
        assert!(!client.is_configured());
    }

    #[test]
    fn test_station_to_record() {
        let station: CheckWxStation = serde_json::from_value(serde_json::json!({
            "icao": "KJFK",
            "iata": "JFK",
            "name": "John F Kennedy International",
            "country": { "code": "US", "name": "United States" },
            "latitude": { "decimal": 40.639801 },
            "longitude": { "decimal": -73.7789 },
            "elevation": { "feet": 13.0, "meters": 4.0 }
        }))
        .unwrap();
        let record = station_to_record(station).unwrap();
        assert_eq!(record.icao, "KJFK");
        assert_eq!(record.country, "US");
        assert_eq!(record.elevation_ft, Some(13));
    }

    #[tokio::test]
    async fn test_fetch_metar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metar/KJFK"))
            .and(header("X-API-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": 1,
                "data": ["KJFK 121251Z 28014G20KT 10SM FEW250 24/18 A3000"]
            })))
            .mount(&server)
            .await;

        let raw = client_for(&server, Some("secret"))
            .fetch_report(ReportKind::Metar, "KJFK")
            .await
            .unwrap();
        assert!(raw.starts_with("KJFK 121251Z"));
    }

    #[tokio::test]
    async fn test_fetch_empty_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taf/ZZZZ"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": 0, "data": [] })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Some("secret"))
            .fetch_report(ReportKind::Taf, "ZZZZ")
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NotFound);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_breaker_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("bad"))
            .fetch_report(ReportKind::Metar, "KJFK")
            .await
            .unwrap_err();
        assert!(err.trips_breaker());
    }

    #[tokio::test]
    async fn test_fetch_nearest_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metar/lat/40.0000/lon/-80.0000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": 1,
                "data": ["KPIT 121251Z 27008KT 10SM SCT040 18/09 A3001"]
            })))
            .mount(&server)
            .await;

        let nearest = client_for(&server, Some("secret"))
            .fetch_nearest_report(
                ReportKind::Metar,
                Coordinate {
                    latitude: 40.0,
                    longitude: -80.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(nearest.station, "KPIT");
    }
}
