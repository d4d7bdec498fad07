//! Route briefing synthesis.
//!
//! Builds a complete pre-flight briefing for a [`RoutePlan`]:
//! 1. Validate and resolve every airport (fail fast on an unknown code)
//! 2. Fetch METAR, TAF and NOTAMs per airport, all airports concurrently
//! 3. Decode and classify, folding the worst METAR severity
//! 4. Sample the great circle between origin and destination and fetch the
//!    nearest-station report for each point, concurrently
//! 5. Derive critical alerts and recommendations
//!
//! A failed fetch or decode degrades that entry only. An unresolvable
//! airport aborts the briefing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::helpers::{is_valid_icao, normalize_icao, round_to};
use crate::models::{AirportRecord, Coordinate, Notam, RawReport, ReportKind, RoutePlan};
use crate::services::decoder::{decode, DecodedReport};
use crate::services::geo::{clamp_samples, distance_nm, sample_great_circle, DEFAULT_ENROUTE_SAMPLES};
use crate::services::providers::gateway::ProviderGateway;
use crate::services::severity::{
    classify, classify_forecast, classify_reduced, flight_category, max_severity, FlightCategory,
    SeverityLevel, SeverityVerdict,
};

/// Temperature drop per 1000 ft used for the enroute estimate (°C).
const LAPSE_RATE_C_PER_1000_FT: f64 = 2.0;
/// Estimated temperatures in this band (°C) carry an icing risk when
/// moisture is present.
const ICING_BAND_C: (f64, f64) = (-20.0, 0.0);

const RECOMMEND_DELAY: &str = "Consider delaying departure until conditions improve";
const RECOMMEND_ALTERNATES: &str = "Review alternate airports and carry additional fuel";
const RECOMMEND_MONITOR: &str = "Monitor conditions closely before and during the flight";
const RECOMMEND_ALTITUDE: &str = "Consider altitude changes to avoid icing conditions";
const RECOMMEND_FAVORABLE: &str = "Weather conditions are favorable for flight";
const RECOMMEND_REVIEW_ALERTS: &str = "Review all critical alerts before departure";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("invalid airport '{code}': {reason}")]
    InvalidAirport { code: String, reason: String },
}

/// Role of an airport within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AirportRole {
    Origin,
    Destination,
    Alternate,
}

/// A fetched report with its decoding and verdict.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherEntry {
    pub raw: RawReport,
    pub decoded: DecodedReport,
    pub severity: SeverityVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AirportBriefing {
    pub role: AirportRole,
    pub airport: AirportRecord,
    pub metar: Option<WeatherEntry>,
    pub taf: Option<WeatherEntry>,
    pub notams: Vec<Notam>,
    /// Flight category from the METAR, if it reports visibility or sky
    pub flight_category: Option<FlightCategory>,
    /// Data that could not be obtained or decoded
    pub errors: Vec<String>,
}

impl AirportBriefing {
    fn metar_verdict(&self) -> Option<&SeverityVerdict> {
        self.metar.as_ref().map(|m| &m.severity)
    }
}

/// One sampled point along the route.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnroutePoint {
    /// 1-based position along the route
    pub index: usize,
    pub coordinate: Coordinate,
    /// Distance from the origin along the route (nm)
    pub distance_from_origin_nm: f64,
    /// Reporting station nearest to the point
    pub station: Option<String>,
    /// Distance from the point to the station (nm), when known
    pub station_distance_nm: Option<f64>,
    pub metar: Option<WeatherEntry>,
    /// Estimated temperature at the requested flight level (°C)
    pub estimated_temperature_c: Option<f64>,
    pub icing_risk: bool,
    pub error: Option<String>,
}

impl EnroutePoint {
    fn verdict(&self) -> Option<&SeverityVerdict> {
        self.metar.as_ref().map(|m| &m.severity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Weather,
    Notam,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CriticalAlert {
    pub airport: String,
    pub source: AlertSource,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BriefingSummary {
    pub worst_severity: SeverityLevel,
    pub critical_alerts: Vec<CriticalAlert>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Briefing {
    pub briefing_id: Uuid,
    pub route: RoutePlan,
    /// Airports keyed by ICAO code
    pub airports: BTreeMap<String, AirportBriefing>,
    pub enroute: Vec<EnroutePoint>,
    pub summary: BriefingSummary,
    pub generated_at: DateTime<Utc>,
}

/// Enroute samples between two airports.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnrouteReport {
    pub origin: AirportRecord,
    pub destination: AirportRecord,
    /// Great-circle distance between the airports (nm)
    pub distance_nm: f64,
    pub flight_level: Option<u16>,
    pub points: Vec<EnroutePoint>,
    pub worst_severity: SeverityLevel,
}

pub struct BriefingSynthesizer {
    gateway: Arc<ProviderGateway>,
}

impl BriefingSynthesizer {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self { gateway }
    }

    pub async fn build(&self, plan: RoutePlan) -> Result<Briefing, SynthesisError> {
        let plan = RoutePlan {
            origin: normalize_icao(&plan.origin),
            destination: normalize_icao(&plan.destination),
            alternates: plan.alternates.iter().map(|c| normalize_icao(c)).collect(),
            ..plan
        };

        // Roles in plan order; a code listed twice keeps its first role
        let mut roles: Vec<(String, AirportRole)> = Vec::new();
        for (i, code) in plan.airport_codes().into_iter().enumerate() {
            if !is_valid_icao(code) {
                return Err(SynthesisError::InvalidAirport {
                    code: code.to_string(),
                    reason: "ICAO codes are 4 alphanumeric characters".to_string(),
                });
            }
            let role = match i {
                0 => AirportRole::Origin,
                1 => AirportRole::Destination,
                _ => AirportRole::Alternate,
            };
            if !roles.iter().any(|(c, _)| c == code) {
                roles.push((code.to_string(), role));
            }
        }

        let records = self.resolve_airports(roles.iter().map(|(c, _)| c.as_str())).await?;

        tracing::info!(
            "Building briefing {} -> {} ({} alternates)",
            plan.origin,
            plan.destination,
            plan.alternates.len()
        );

        let (codes, roles): (Vec<String>, Vec<AirportRole>) = roles.into_iter().unzip();
        let coordinate_of = |code: &str| {
            codes
                .iter()
                .position(|c| c == code)
                .map(|i| records[i].coordinate())
        };
        let route_ends =
            coordinate_of(plan.origin.as_str()).zip(coordinate_of(plan.destination.as_str()));

        // Airport fetches and enroute sampling run side by side
        let airport_entries = futures::future::join_all(
            roles
                .into_iter()
                .zip(records)
                .map(|(role, airport)| self.brief_airport(role, airport)),
        );
        let enroute_points = async {
            match route_ends {
                Some((from, to)) => {
                    self.sample_route(from, to, DEFAULT_ENROUTE_SAMPLES, plan.flight_level)
                        .await
                }
                None => Vec::new(),
            }
        };
        let (entries, enroute) = tokio::join!(airport_entries, enroute_points);
        let airports: BTreeMap<String, AirportBriefing> = codes.into_iter().zip(entries).collect();

        let worst_severity = airports
            .values()
            .filter_map(AirportBriefing::metar_verdict)
            .chain(enroute.iter().filter_map(EnroutePoint::verdict))
            .map(|v| v.level)
            .fold(SeverityLevel::Normal, max_severity);

        let critical_alerts = critical_alerts(&airports);
        let recommendations = recommendations(worst_severity, !critical_alerts.is_empty());

        Ok(Briefing {
            briefing_id: Uuid::new_v4(),
            route: plan,
            airports,
            enroute,
            summary: BriefingSummary {
                worst_severity,
                critical_alerts,
                recommendations,
            },
            generated_at: Utc::now(),
        })
    }

    /// Enroute weather between two airports. `samples` is clamped to the
    /// accepted range.
    pub async fn enroute(
        &self,
        origin: &str,
        destination: &str,
        samples: usize,
        flight_level: Option<u16>,
    ) -> Result<EnrouteReport, SynthesisError> {
        let codes = [normalize_icao(origin), normalize_icao(destination)];
        if let Some(bad) = codes.iter().find(|c| !is_valid_icao(c)) {
            return Err(SynthesisError::InvalidAirport {
                code: bad.clone(),
                reason: "ICAO codes are 4 alphanumeric characters".to_string(),
            });
        }

        let mut records = self
            .resolve_airports(codes.iter().map(String::as_str))
            .await?
            .into_iter();
        let (Some(from), Some(to)) = (records.next(), records.next()) else {
            return Err(SynthesisError::InvalidAirport {
                code: codes[0].clone(),
                reason: "airport could not be resolved".to_string(),
            });
        };

        let points = self
            .sample_route(
                from.coordinate(),
                to.coordinate(),
                clamp_samples(samples),
                flight_level,
            )
            .await;
        let worst_severity =
            classify_reduced(points.iter().filter_map(|p| p.metar.as_ref().map(|m| &m.decoded))).level;

        Ok(EnrouteReport {
            distance_nm: round_to(distance_nm(from.coordinate(), to.coordinate()), 1),
            origin: from,
            destination: to,
            flight_level,
            points,
            worst_severity,
        })
    }

    /// Resolve every code concurrently, in order. Any failure aborts.
    async fn resolve_airports<'a>(
        &self,
        codes: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<AirportRecord>, SynthesisError> {
        let codes: Vec<&str> = codes.collect();
        let results =
            futures::future::join_all(codes.iter().map(|c| self.gateway.fetch_airport(c))).await;

        codes
            .into_iter()
            .zip(results)
            .map(|(code, result)| {
                result.map_err(|e| {
                    tracing::warn!("Briefing rejected, cannot resolve {}: {}", code, e);
                    SynthesisError::InvalidAirport {
                        code: code.to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    async fn brief_airport(&self, role: AirportRole, airport: AirportRecord) -> AirportBriefing {
        let icao = airport.icao.as_str();
        let (metar, taf, notams) = tokio::join!(
            self.gateway.fetch(ReportKind::Metar, icao),
            self.gateway.fetch(ReportKind::Taf, icao),
            self.gateway.fetch_notams(icao),
        );

        let mut errors = Vec::new();
        let metar = metar
            .map_err(|e| e.to_string())
            .and_then(|raw| decoded_entry(raw, classify))
            .map_err(|e| errors.push(format!("METAR unavailable: {}", e)))
            .ok();
        let taf = taf
            .map_err(|e| e.to_string())
            .and_then(|raw| decoded_entry(raw, classify_forecast))
            .map_err(|e| errors.push(format!("TAF unavailable: {}", e)))
            .ok();
        let notams = notams.unwrap_or_else(|e| {
            errors.push(format!("NOTAMs unavailable: {}", e));
            Vec::new()
        });

        if !errors.is_empty() {
            tracing::warn!("Degraded briefing entry for {}: {}", icao, errors.join("; "));
        }

        AirportBriefing {
            role,
            flight_category: metar
                .as_ref()
                .and_then(|m| flight_category(&m.decoded.conditions)),
            airport,
            metar,
            taf,
            notams,
            errors,
        }
    }

    async fn sample_route(
        &self,
        from: Coordinate,
        to: Coordinate,
        samples: usize,
        flight_level: Option<u16>,
    ) -> Vec<EnroutePoint> {
        let points = sample_great_circle(from, to, samples);
        futures::future::join_all(points.into_iter().enumerate().map(|(i, point)| async move {
            let mut entry = EnroutePoint {
                index: i + 1,
                coordinate: point,
                distance_from_origin_nm: round_to(distance_nm(from, point), 1),
                station: None,
                station_distance_nm: None,
                metar: None,
                estimated_temperature_c: None,
                icing_risk: false,
                error: None,
            };

            match self.gateway.fetch_nearest_report(ReportKind::Metar, point).await {
                Ok(nearest) => {
                    entry.station = Some(nearest.station);
                    entry.station_distance_nm = nearest.distance_nm.map(|d| round_to(d, 1));
                    match decoded_entry(nearest.report, classify) {
                        Ok(metar) => {
                            if let Some(level) = flight_level {
                                let (estimate, icing) = estimate_at_level(&metar.decoded, level);
                                entry.estimated_temperature_c = estimate;
                                entry.icing_risk = icing;
                            }
                            entry.metar = Some(metar);
                        }
                        Err(e) => entry.error = Some(e),
                    }
                }
                Err(e) => entry.error = Some(e.to_string()),
            }
            entry
        }))
        .await
    }
}

fn decoded_entry(
    raw: RawReport,
    classifier: fn(&DecodedReport) -> SeverityVerdict,
) -> Result<WeatherEntry, String> {
    let decoded = decode(&raw.raw_text, raw.kind).map_err(|e| e.to_string())?;
    let severity = classifier(&decoded);
    Ok(WeatherEntry {
        raw,
        decoded,
        severity,
    })
}

/// Surface temperature lapsed to the flight level, and whether that
/// temperature meets visible moisture.
fn estimate_at_level(report: &DecodedReport, flight_level: u16) -> (Option<f64>, bool) {
    let Some(surface) = report.temperature_c else {
        return (None, false);
    };
    let altitude_ft = f64::from(flight_level) * 100.0;
    let estimate = round_to(
        f64::from(surface) - LAPSE_RATE_C_PER_1000_FT * altitude_ft / 1000.0,
        1,
    );
    let moisture = !report.conditions.clouds.is_empty()
        || report
            .conditions
            .weather
            .iter()
            .any(|w| w.has_precipitation());
    let icing = moisture && (ICING_BAND_C.0..=ICING_BAND_C.1).contains(&estimate);
    (Some(estimate), icing)
}

/// One alert per airport with a critical METAR, one per critical NOTAM.
fn critical_alerts(airports: &BTreeMap<String, AirportBriefing>) -> Vec<CriticalAlert> {
    let mut alerts = Vec::new();
    for (icao, entry) in airports {
        if let Some(verdict) = entry.metar_verdict() {
            if verdict.level == SeverityLevel::Critical {
                alerts.push(CriticalAlert {
                    airport: icao.clone(),
                    source: AlertSource::Weather,
                    message: verdict.reasons.join(", "),
                });
            }
        }
        alerts.extend(
            entry
                .notams
                .iter()
                .filter(|n| n.severity == SeverityLevel::Critical)
                .map(|n| CriticalAlert {
                    airport: icao.clone(),
                    source: AlertSource::Notam,
                    message: format!("{}: {}", n.id, n.text),
                }),
        );
    }
    alerts
}

fn recommendations(worst: SeverityLevel, has_critical_alerts: bool) -> Vec<String> {
    let mut out: Vec<String> = match worst {
        SeverityLevel::Critical => vec![RECOMMEND_DELAY, RECOMMEND_ALTERNATES],
        SeverityLevel::Caution => vec![RECOMMEND_MONITOR, RECOMMEND_ALTITUDE],
        SeverityLevel::Normal => vec![RECOMMEND_FAVORABLE],
    }
    .into_iter()
    .map(str::to_string)
    .collect();
    if has_critical_alerts {
        out.push(RECOMMEND_REVIEW_ALERTS.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::airports;
    use crate::services::cache::{airport_fingerprint, CachedPayload, ReportCache};
    use crate::services::providers::gateway::tests::MockProvider;
    use crate::services::providers::synthetic::SYNTHETIC_SOURCE;
    use crate::services::providers::{NearestReport, WeatherProvider};
    use std::time::Duration;

    const KJFK_METAR: &str = "METAR KJFK 121251Z 28014G20KT 10SM FEW250 24/18 A3000";
    const KLAX_METAR: &str = "METAR KLAX 121253Z 25008KT 10SM FEW015 SCT200 19/14 A2992";
    const KORD_METAR: &str =
        "METAR KORD 121251Z 27035G45KT 1/2SM +TSRA BKN008 OVC020 CB 15/14 A2965";
    const ENROUTE_METAR: &str = "METAR KICT 121253Z 18010KT 10SM FEW050 20/10 A3002";
    const KJFK_TAF: &str = "TAF KJFK 121120Z 1212/1318 28012KT P6SM FEW250";
    const KLAX_TAF: &str = "TAF KLAX 121120Z 1212/1318 25008KT P6SM FEW015";

    fn plan(origin: &str, destination: &str, alternates: &[&str]) -> RoutePlan {
        RoutePlan {
            origin: origin.to_string(),
            destination: destination.to_string(),
            alternates: alternates.iter().map(|s| s.to_string()).collect(),
            flight_level: None,
            route: None,
        }
    }

    fn nearest(raw: &str) -> NearestReport {
        NearestReport {
            station: "KICT".to_string(),
            coordinate: None,
            raw_text: raw.to_string(),
        }
    }

    fn normal_provider() -> MockProvider {
        MockProvider::new("mock")
            .with_report(ReportKind::Metar, "KJFK", Ok(KJFK_METAR))
            .with_report(ReportKind::Metar, "KLAX", Ok(KLAX_METAR))
            .with_report(ReportKind::Taf, "KJFK", Ok(KJFK_TAF))
            .with_report(ReportKind::Taf, "KLAX", Ok(KLAX_TAF))
            .with_notams("KJFK", vec![])
            .with_notams("KLAX", vec![])
            .with_nearest(Ok(nearest(ENROUTE_METAR)))
    }

    fn synthesizer(provider: Arc<MockProvider>) -> BriefingSynthesizer {
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![provider];
        BriefingSynthesizer::new(Arc::new(ProviderGateway::new(
            providers,
            Arc::new(ReportCache::default()),
            Duration::from_secs(1),
        )))
    }

    #[tokio::test]
    async fn test_normal_route_is_favorable() {
        let synth = synthesizer(Arc::new(normal_provider()));
        let briefing = synth.build(plan("KJFK", "KLAX", &[])).await.unwrap();

        assert_eq!(briefing.summary.worst_severity, SeverityLevel::Normal);
        assert_eq!(briefing.summary.recommendations, vec![RECOMMEND_FAVORABLE]);
        assert!(briefing.summary.critical_alerts.is_empty());

        assert_eq!(briefing.airports.len(), 2);
        let jfk = &briefing.airports["KJFK"];
        assert_eq!(jfk.role, AirportRole::Origin);
        assert_eq!(jfk.flight_category, Some(FlightCategory::Vfr));
        assert!(jfk.errors.is_empty());
        assert_eq!(briefing.airports["KLAX"].role, AirportRole::Destination);

        assert_eq!(briefing.enroute.len(), DEFAULT_ENROUTE_SAMPLES);
        assert!(briefing
            .enroute
            .windows(2)
            .all(|w| w[0].distance_from_origin_nm < w[1].distance_from_origin_nm));
        assert_eq!(briefing.enroute[0].station.as_deref(), Some("KICT"));
    }

    #[tokio::test]
    async fn test_malformed_code_fails_before_any_fetch() {
        let provider = Arc::new(normal_provider());
        let synth = synthesizer(provider.clone());

        let err = synth.build(plan("JFK", "KLAX", &[])).await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidAirport { ref code, .. } if code == "JFK"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_airport_aborts() {
        let synth = synthesizer(Arc::new(normal_provider()));
        let err = synth.build(plan("KJFK", "KLAX", &["ZZZZ"])).await.unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidAirport { ref code, .. } if code == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_critical_alternate_raises_worst_and_alerts() {
        let provider = normal_provider()
            .with_report(ReportKind::Metar, "KORD", Ok(KORD_METAR))
            .with_notams(
                "KORD",
                vec![Notam {
                    id: "A0500/26".to_string(),
                    airport: "KORD".to_string(),
                    text: "RWY 10L/28R CLSD".to_string(),
                    effective_from: None,
                    effective_to: None,
                    severity: SeverityLevel::Critical,
                }],
            );
        let synth = synthesizer(Arc::new(provider));
        let briefing = synth.build(plan("kjfk", "klax", &["kord"])).await.unwrap();

        assert_eq!(briefing.route.alternates, vec!["KORD"]);
        assert_eq!(briefing.airports["KORD"].role, AirportRole::Alternate);
        assert_eq!(briefing.summary.worst_severity, SeverityLevel::Critical);

        let alerts = &briefing.summary.critical_alerts;
        assert_eq!(alerts.len(), 2);
        assert!(alerts
            .iter()
            .any(|a| a.source == AlertSource::Weather && a.message.contains("Thunderstorm activity")));
        assert!(alerts
            .iter()
            .any(|a| a.source == AlertSource::Notam && a.message.starts_with("A0500/26")));

        assert_eq!(
            briefing.summary.recommendations,
            vec![RECOMMEND_DELAY, RECOMMEND_ALTERNATES, RECOMMEND_REVIEW_ALERTS]
        );
    }

    #[tokio::test]
    async fn test_undecodable_provider_report_is_replaced() {
        let provider = normal_provider().with_report(ReportKind::Taf, "KLAX", Ok("TAF KLAX GARBAGE"));
        let synth = synthesizer(Arc::new(provider));
        let briefing = synth.build(plan("KJFK", "KLAX", &[])).await.unwrap();

        let lax = &briefing.airports["KLAX"];
        assert!(lax.errors.is_empty());
        assert_eq!(lax.taf.as_ref().unwrap().raw.source, SYNTHETIC_SOURCE);
        assert_eq!(lax.metar.as_ref().unwrap().raw.source, "mock");
    }

    #[tokio::test]
    async fn test_airport_and_enroute_fetches_overlap() {
        let mut provider = normal_provider();
        provider.delay = Some(Duration::from_millis(200));
        let cache = Arc::new(ReportCache::default());
        for icao in ["KJFK", "KLAX"] {
            let record = airports::lookup(icao).unwrap();
            cache
                .put(&airport_fingerprint(icao), CachedPayload::Airport(record))
                .await;
        }
        let providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(provider)];
        let synth = BriefingSynthesizer::new(Arc::new(ProviderGateway::new(
            providers,
            cache,
            Duration::from_secs(1),
        )));

        let started = std::time::Instant::now();
        let briefing = synth.build(plan("KJFK", "KLAX", &[])).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(briefing.enroute.len(), DEFAULT_ENROUTE_SAMPLES);
        assert!(briefing.enroute.iter().all(|p| p.metar.is_some()));
        // One provider round trip, not one for airports plus one for enroute
        assert!(elapsed < Duration::from_millis(380), "briefing took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_caution_enroute_folds_into_worst() {
        let provider = normal_provider().with_nearest(Ok(nearest(
            "METAR KICT 121253Z 18022KT 4SM -RA BKN040 12/10 A2990",
        )));
        let synth = synthesizer(Arc::new(provider));
        let briefing = synth.build(plan("KJFK", "KLAX", &[])).await.unwrap();

        assert_eq!(briefing.summary.worst_severity, SeverityLevel::Caution);
        assert_eq!(
            briefing.summary.recommendations,
            vec![RECOMMEND_MONITOR, RECOMMEND_ALTITUDE]
        );

        let report = synth.enroute("KJFK", "KLAX", 3, None).await.unwrap();
        assert_eq!(report.worst_severity, SeverityLevel::Caution);
    }

    #[tokio::test]
    async fn test_enroute_clamps_samples_and_estimates_icing() {
        let provider = normal_provider().with_nearest(Ok(nearest(
            "METAR KICT 121253Z 18010KT 10SM BKN030 08/02 A3002",
        )));
        let synth = synthesizer(Arc::new(provider));

        let report = synth.enroute("KJFK", "KLAX", 500, Some(60)).await.unwrap();
        assert_eq!(report.points.len(), 50);
        assert!(report.distance_nm > 2000.0);

        // 8°C at the surface, 6000 ft → -4°C in cloud
        let point = &report.points[0];
        assert_eq!(point.estimated_temperature_c, Some(-4.0));
        assert!(point.icing_risk);

        let few = synth.enroute("KJFK", "KLAX", 0, None).await.unwrap();
        assert_eq!(few.points.len(), 2);
        assert_eq!(few.points[0].estimated_temperature_c, None);
    }

    #[tokio::test]
    async fn test_enroute_undecodable_station_uses_table_fallback() {
        let provider = normal_provider().with_nearest(Ok(nearest("METAR KICT NOT A REPORT")));
        let synth = synthesizer(Arc::new(provider));
        let report = synth.enroute("KJFK", "KLAX", 2, None).await.unwrap();
        assert!(report.points.iter().all(|p| p.error.is_none()));
        assert!(report
            .points
            .iter()
            .all(|p| p.metar.as_ref().unwrap().raw.source == SYNTHETIC_SOURCE));
        assert!(report.points.iter().all(|p| p.station.as_deref() != Some("KICT")));
    }

    #[test]
    fn test_estimate_without_moisture_has_no_icing() {
        let report = decode("METAR KDEN 121253Z 19010KT 10SM CLR 05/M10 A3017", ReportKind::Metar).unwrap();
        assert_eq!(estimate_at_level(&report, 50), (Some(-5.0), false));
    }

    #[test]
    fn test_recommendations() {
        assert_eq!(recommendations(SeverityLevel::Normal, false), vec![RECOMMEND_FAVORABLE]);
        assert_eq!(
            recommendations(SeverityLevel::Normal, true),
            vec![RECOMMEND_FAVORABLE, RECOMMEND_REVIEW_ALERTS]
        );
    }
}
