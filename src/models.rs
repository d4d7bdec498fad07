//! Shared data model for reports, airports, NOTAMs and route plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::services::severity::SeverityLevel;

/// Kind of coded weather report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Metar,
    Taf,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Metar => "metar",
            ReportKind::Taf => "taf",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metar" => Ok(ReportKind::Metar),
            "taf" => Ok(ReportKind::Taf),
            other => Err(format!("unknown report kind '{}'", other)),
        }
    }
}

/// A raw report as returned by a provider. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RawReport {
    /// ICAO code of the reporting station
    pub airport: String,
    /// Report kind
    pub kind: ReportKind,
    /// Coded report text
    pub raw_text: String,
    /// When the report was acquired from its source
    pub fetched_at: DateTime<Utc>,
    /// Name of the provider that supplied the report ("synthetic" for generated data)
    pub source: String,
}

/// Airport metadata, cached per ICAO code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AirportRecord {
    /// ICAO code (4 alphanumeric characters)
    pub icao: String,
    /// IATA code, if the airport has one
    pub iata: Option<String>,
    /// Display name
    pub name: String,
    /// Country name or ISO code
    pub country: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Field elevation in feet
    pub elevation_ft: Option<i32>,
}

impl AirportRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A point on the earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A notice to air missions for one airport.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notam {
    /// NOTAM number, e.g. "A1234/26"
    pub id: String,
    /// ICAO code the NOTAM applies to
    pub airport: String,
    /// Full NOTAM text
    pub text: String,
    /// Start of validity, if known
    pub effective_from: Option<DateTime<Utc>>,
    /// End of validity, if known (None = permanent or unknown)
    pub effective_to: Option<DateTime<Utc>>,
    /// Severity derived from the NOTAM text
    pub severity: SeverityLevel,
}

/// A requested flight: origin, destination and alternates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoutePlan {
    /// Origin ICAO code
    pub origin: String,
    /// Destination ICAO code
    pub destination: String,
    /// Alternate ICAO codes, in order of preference
    #[serde(default)]
    pub alternates: Vec<String>,
    /// Requested cruise flight level (e.g. 350 for FL350)
    #[serde(default)]
    pub flight_level: Option<u16>,
    /// Free-form route label (e.g. "J80 DVV")
    #[serde(default)]
    pub route: Option<String>,
}

impl RoutePlan {
    /// All ICAO codes in the plan: origin, destination, then alternates.
    pub fn airport_codes(&self) -> Vec<&str> {
        let mut codes = vec![self.origin.as_str(), self.destination.as_str()];
        codes.extend(self.alternates.iter().map(String::as_str));
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_from_str() {
        assert_eq!("METAR".parse::<ReportKind>().unwrap(), ReportKind::Metar);
        assert_eq!("taf".parse::<ReportKind>().unwrap(), ReportKind::Taf);
        assert!("notam".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_route_plan_defaults() {
        let plan: RoutePlan =
            serde_json::from_value(serde_json::json!({"origin": "KJFK", "destination": "KLAX"}))
                .unwrap();
        assert!(plan.alternates.is_empty());
        assert_eq!(plan.flight_level, None);
        assert_eq!(plan.airport_codes(), vec!["KJFK", "KLAX"]);
    }

    #[test]
    fn test_route_plan_codes_include_alternates() {
        let plan = RoutePlan {
            origin: "KJFK".to_string(),
            destination: "KLAX".to_string(),
            alternates: vec!["KSFO".to_string(), "KLAS".to_string()],
            flight_level: Some(350),
            route: None,
        };
        assert_eq!(plan.airport_codes(), vec!["KJFK", "KLAX", "KSFO", "KLAS"]);
    }
}
