//! Weather data providers and the gateway that chains them.
//!
//! Every external source implements [`WeatherProvider`]. The
//! [`gateway::ProviderGateway`] tries them in priority order, trips a
//! per-provider breaker on authentication or rate-limit failures, and falls
//! back to [`synthetic::SyntheticProvider`] so callers always get data.

pub mod avwx;
pub mod awc;
pub mod checkwx;
pub mod gateway;
pub mod synthetic;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AirportRecord, Coordinate, Notam, ReportKind};

/// Failure of a single provider call. Absorbed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("rate limited")]
    RateLimited,

    #[error("not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("operation not supported by this provider")]
    Unsupported,
}

impl ProviderError {
    /// Authentication and rate-limit failures disable the provider for the
    /// rest of the process lifetime. Everything else only fails this call.
    pub fn trips_breaker(&self) -> bool {
        matches!(self, ProviderError::Unauthorized(_) | ProviderError::RateLimited)
    }
}

/// A report from the station closest to a requested point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestReport {
    /// ICAO code of the reporting station
    pub station: String,
    /// Station position, when the provider reports it
    pub coordinate: Option<Coordinate>,
    pub raw_text: String,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Short name used in logs, health output and `RawReport::source`.
    fn name(&self) -> &'static str;

    /// `false` when required credentials are missing; such providers are skipped.
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_report(&self, kind: ReportKind, icao: &str) -> Result<String, ProviderError>;

    async fn fetch_airport(&self, icao: &str) -> Result<AirportRecord, ProviderError>;

    async fn fetch_nearest_report(
        &self,
        kind: ReportKind,
        point: Coordinate,
    ) -> Result<NearestReport, ProviderError>;

    async fn fetch_notams(&self, _icao: &str) -> Result<Vec<Notam>, ProviderError> {
        Err(ProviderError::Unsupported)
    }
}

/// Shared HTTP client for all providers.
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}

/// Map an HTTP status to the provider error taxonomy.
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), ProviderError> {
    match status.as_u16() {
        200..=299 => Ok(()),
        401 | 403 => Err(ProviderError::Unauthorized(status.as_u16())),
        429 => Err(ProviderError::RateLimited),
        404 => Err(ProviderError::NotFound),
        other => Err(ProviderError::Http(format!("HTTP {}", other))),
    }
}

pub(crate) fn request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Http(e.to_string())
    }
}

/// Station identifier from a raw report ("METAR KJFK ..." or "KJFK ...").
pub(crate) fn station_of(raw: &str) -> Option<String> {
    raw.split_whitespace()
        .find(|t| !matches!(*t, "METAR" | "SPECI" | "TAF" | "AMD" | "COR"))
        .filter(|t| crate::helpers::is_valid_icao(t))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_check_status_mapping() {
        assert_eq!(check_status(StatusCode::OK), Ok(()));
        assert_eq!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(ProviderError::Unauthorized(401))
        );
        assert_eq!(
            check_status(StatusCode::FORBIDDEN),
            Err(ProviderError::Unauthorized(403))
        );
        assert_eq!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(ProviderError::RateLimited)
        );
        assert_eq!(check_status(StatusCode::NOT_FOUND), Err(ProviderError::NotFound));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ProviderError::Http(_))
        ));
    }

    #[test]
    fn test_trips_breaker() {
        assert!(ProviderError::Unauthorized(401).trips_breaker());
        assert!(ProviderError::RateLimited.trips_breaker());
        assert!(!ProviderError::NotFound.trips_breaker());
        assert!(!ProviderError::Timeout.trips_breaker());
        assert!(!ProviderError::Http("boom".to_string()).trips_breaker());
    }

    #[test]
    fn test_station_of() {
        assert_eq!(station_of("METAR KJFK 121251Z 28014KT"), Some("KJFK".to_string()));
        assert_eq!(station_of("TAF AMD EGLL 121100Z"), Some("EGLL".to_string()));
        assert_eq!(station_of("KSFO 121256Z 00000KT"), Some("KSFO".to_string()));
        assert_eq!(station_of(""), None);
    }
}
