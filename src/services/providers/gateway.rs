//! Ordered provider chain with per-provider breakers, caching and a
//! synthetic fallback.
//!
//! Resolution for METAR/TAF/NOTAMs:
//! 1. Cache lookup by fingerprint
//! 2. Each configured provider whose breaker has not tripped, in priority order
//! 3. Synthetic data
//!
//! A provider that answers 401/403/429 is disabled until restart. A 404,
//! a timeout or any other failure only affects the current call. Report
//! text that does not decode counts as a miss and the chain moves on.

use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use super::synthetic::SyntheticProvider;
use super::{ProviderError, WeatherProvider};
use crate::helpers::{is_valid_icao, normalize_icao};
use crate::models::{AirportRecord, Coordinate, Notam, RawReport, ReportKind};
use crate::services::airports;
use crate::services::cache::{
    airport_fingerprint, notam_fingerprint, report_fingerprint, CachedPayload, ReportCache,
};
use crate::services::decoder::decode;
use crate::services::geo::distance_nm;

/// Data acquisition failure after the whole chain has been consulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("provider failure: {0}")]
    ProviderFailure(String),
}

/// Breaker state of one provider, for health output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProviderStatus {
    pub name: String,
    /// Credentials present (or no credentials needed)
    pub configured: bool,
    /// Disabled for the rest of the process lifetime
    pub tripped: bool,
}

/// Report from the station nearest to a requested point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestStationReport {
    pub station: String,
    /// Distance from the requested point to the station, when known
    pub distance_nm: Option<f64>,
    pub report: RawReport,
}

struct ProviderSlot {
    provider: Arc<dyn WeatherProvider>,
    tripped: AtomicBool,
}

pub struct ProviderGateway {
    chain: Vec<ProviderSlot>,
    synthetic: SyntheticProvider,
    cache: Arc<ReportCache>,
    attempt_timeout: Duration,
}

impl ProviderGateway {
    /// `providers` are tried in the given order.
    pub fn new(
        providers: Vec<Arc<dyn WeatherProvider>>,
        cache: Arc<ReportCache>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            chain: providers
                .into_iter()
                .map(|provider| ProviderSlot {
                    provider,
                    tripped: AtomicBool::new(false),
                })
                .collect(),
            synthetic: SyntheticProvider::new(),
            cache,
            attempt_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<ReportCache> {
        &self.cache
    }

    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.chain
            .iter()
            .map(|slot| ProviderStatus {
                name: slot.provider.name().to_string(),
                configured: slot.provider.is_configured(),
                tripped: slot.tripped.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Providers still eligible for a call.
    fn available(&self) -> impl Iterator<Item = &ProviderSlot> {
        self.chain
            .iter()
            .filter(|slot| slot.provider.is_configured() && !slot.tripped.load(Ordering::Relaxed))
    }

    /// Run one provider call under the attempt timeout, tripping the
    /// breaker when the failure calls for it.
    async fn run_attempt<T, F>(&self, slot: &ProviderSlot, what: &str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let name = slot.provider.name();
        let result = match tokio::time::timeout(self.attempt_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match &result {
            Ok(_) => tracing::info!("{} served {}", name, what),
            Err(ProviderError::NotFound) | Err(ProviderError::Unsupported) => {
                tracing::debug!("{} has no {}", name, what)
            }
            Err(e) if e.trips_breaker() => {
                slot.tripped.store(true, Ordering::Relaxed);
                tracing::warn!("{} disabled after {} failure: {}", name, what, e);
            }
            Err(e) => tracing::warn!("{} failed for {}: {}", name, what, e),
        }
        result
    }

    /// Latest METAR or TAF for an airport. Falls back to synthetic data, so
    /// this only fails for codes that are not well-formed ICAO identifiers.
    pub async fn fetch(&self, kind: ReportKind, icao: &str) -> Result<RawReport, DataError> {
        let icao = normalize_icao(icao);
        if !is_valid_icao(&icao) {
            return Err(DataError::NotFound(format!("invalid ICAO code '{}'", icao)));
        }

        let fingerprint = report_fingerprint(kind, &icao);
        if let Some(CachedPayload::Report(report)) = self.cache.get(&fingerprint).await {
            return Ok(report);
        }

        let what = format!("{} {}", kind, icao);
        let mut fetched = None;
        for slot in self.available() {
            if let Ok(raw_text) = self
                .run_attempt(slot, &what, slot.provider.fetch_report(kind, &icao))
                .await
            {
                if !decodes(slot, &what, &raw_text, kind) {
                    continue;
                }
                fetched = Some(RawReport {
                    airport: icao.clone(),
                    kind,
                    raw_text,
                    fetched_at: Utc::now(),
                    source: slot.provider.name().to_string(),
                });
                break;
            }
        }

        let report = match fetched {
            Some(report) => report,
            None => {
                tracing::warn!("No provider served {}, using synthetic data", what);
                self.synthetic.report(kind, &icao)
            }
        };

        self.cache
            .put(&fingerprint, CachedPayload::Report(report.clone()))
            .await;
        Ok(report)
    }

    /// Airport metadata. Unknown codes fail with `DataError::NotFound`.
    pub async fn fetch_airport(&self, icao: &str) -> Result<AirportRecord, DataError> {
        let icao = normalize_icao(icao);
        if !is_valid_icao(&icao) {
            return Err(DataError::NotFound(format!("invalid ICAO code '{}'", icao)));
        }

        let fingerprint = airport_fingerprint(&icao);
        if let Some(CachedPayload::Airport(airport)) = self.cache.get(&fingerprint).await {
            return Ok(airport);
        }

        let what = format!("airport {}", icao);
        let mut found = None;
        for slot in self.available() {
            if let Ok(airport) = self
                .run_attempt(slot, &what, slot.provider.fetch_airport(&icao))
                .await
            {
                found = Some(airport);
                break;
            }
        }

        let airport = match found.or_else(|| airports::lookup(&icao)) {
            Some(airport) => airport,
            None => return Err(DataError::NotFound(format!("unknown airport '{}'", icao))),
        };

        self.cache
            .put(&fingerprint, CachedPayload::Airport(airport.clone()))
            .await;
        Ok(airport)
    }

    /// Report from the station nearest to `point`. Never cached. The
    /// synthetic fallback reports for the closest airport in the built-in
    /// table.
    pub async fn fetch_nearest_report(
        &self,
        kind: ReportKind,
        point: Coordinate,
    ) -> Result<NearestStationReport, DataError> {
        let what = format!(
            "nearest {} to ({:.2}, {:.2})",
            kind, point.latitude, point.longitude
        );

        for slot in self.available() {
            if let Ok(nearest) = self
                .run_attempt(slot, &what, slot.provider.fetch_nearest_report(kind, point))
                .await
            {
                if !decodes(slot, &what, &nearest.raw_text, kind) {
                    continue;
                }
                return Ok(NearestStationReport {
                    distance_nm: nearest.coordinate.map(|c| distance_nm(point, c)),
                    report: RawReport {
                        airport: nearest.station.clone(),
                        kind,
                        raw_text: nearest.raw_text,
                        fetched_at: Utc::now(),
                        source: slot.provider.name().to_string(),
                    },
                    station: nearest.station,
                });
            }
        }

        let (airport, distance) = airports::nearest(point)
            .ok_or_else(|| DataError::ProviderFailure(format!("no station for {}", what)))?;
        tracing::warn!(
            "No provider served {}, using synthetic data for {}",
            what,
            airport.icao
        );
        Ok(NearestStationReport {
            distance_nm: Some(distance),
            report: self.synthetic.report(kind, &airport.icao),
            station: airport.icao,
        })
    }

    /// NOTAMs for an airport. Falls back to built-in samples or an empty list.
    pub async fn fetch_notams(&self, icao: &str) -> Result<Vec<Notam>, DataError> {
        let icao = normalize_icao(icao);
        if !is_valid_icao(&icao) {
            return Err(DataError::NotFound(format!("invalid ICAO code '{}'", icao)));
        }

        let fingerprint = notam_fingerprint(&icao);
        if let Some(CachedPayload::Notams(notams)) = self.cache.get(&fingerprint).await {
            return Ok(notams);
        }

        let what = format!("NOTAMs {}", icao);
        let mut fetched = None;
        for slot in self.available() {
            if let Ok(notams) = self
                .run_attempt(slot, &what, slot.provider.fetch_notams(&icao))
                .await
            {
                fetched = Some(notams);
                break;
            }
        }

        let notams = fetched.unwrap_or_else(|| self.synthetic.notams(&icao));
        self.cache
            .put(&fingerprint, CachedPayload::Notams(notams.clone()))
            .await;
        Ok(notams)
    }
}

/// Provider text is only accepted when it decodes.
fn decodes(slot: &ProviderSlot, what: &str, raw_text: &str, kind: ReportKind) -> bool {
    match decode(raw_text, kind) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("{} sent unusable {}: {}", slot.provider.name(), what, e);
            false
        }
    }
}
