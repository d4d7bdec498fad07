//! Flight-safety severity classification.
//!
//! Thresholds are evaluated critical tier first; when any critical rule
//! matches the caution tier is not consulted. Visibility is always
//! normalised to meters before comparison.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::decoder::{Conditions, DecodedReport, Intensity};

/// Visibility at or below which conditions are critical (meters).
const CRITICAL_VISIBILITY_M: f64 = 3000.0;
/// Ceiling at or below which conditions are critical (feet).
const CRITICAL_CEILING_FT: u32 = 200;
/// Gust speed at or above which conditions are critical (knots).
const CRITICAL_GUST_KT: u16 = 35;
/// Sustained wind at or above which conditions are critical (knots).
const CRITICAL_WIND_KT: u16 = 25;
/// Surface temperature at or below which icing is assumed (°C).
const FREEZING_TEMPERATURE_C: i32 = 0;

const CAUTION_VISIBILITY_M: f64 = 5000.0;
const CAUTION_CEILING_FT: u32 = 1000;
const CAUTION_GUST_KT: u16 = 25;
const CAUTION_WIND_KT: u16 = 20;

/// Three-level flight-safety severity, totally ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Normal,
    Caution,
    Critical,
}

impl SeverityLevel {
    pub fn emoji(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "🟢",
            SeverityLevel::Caution => "🟡",
            SeverityLevel::Critical => "🔴",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SeverityLevel::Normal => "Conditions within normal limits",
            SeverityLevel::Caution => "Exercise caution",
            SeverityLevel::Critical => "Hazardous conditions",
        }
    }
}

/// Worst of two severities.
pub fn max_severity(a: SeverityLevel, b: SeverityLevel) -> SeverityLevel {
    a.max(b)
}

/// A severity level with the reasons that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeverityVerdict {
    pub level: SeverityLevel,
    /// Triggering conditions, e.g. "Severe wind gusts"
    pub reasons: Vec<String>,
    pub emoji: String,
    pub description: String,
}

impl SeverityVerdict {
    pub fn new(level: SeverityLevel, reasons: Vec<String>) -> Self {
        Self {
            level,
            reasons,
            emoji: level.emoji().to_string(),
            description: level.description().to_string(),
        }
    }

    pub fn normal() -> Self {
        Self::new(SeverityLevel::Normal, Vec::new())
    }
}

/// Classify a METAR, or a TAF's initial conditions.
pub fn classify(report: &DecodedReport) -> SeverityVerdict {
    classify_conditions(&report.conditions, report.temperature_c)
}

/// Classify a TAF: initial conditions and every change period, worst wins.
pub fn classify_forecast(report: &DecodedReport) -> SeverityVerdict {
    reduce(
        report
            .all_conditions()
            .map(|c| classify_conditions(c, report.temperature_c)),
    )
}

/// Classify each observation in a list and keep the worst verdict, e.g.
/// the station reports sampled along a route.
pub fn classify_reduced<'a>(reports: impl IntoIterator<Item = &'a DecodedReport>) -> SeverityVerdict {
    reduce(reports.into_iter().map(classify))
}

/// Fold verdicts to the maximum level, keeping the deduplicated union of
/// reasons seen at that level. An empty input is `normal`.
pub fn reduce(verdicts: impl IntoIterator<Item = SeverityVerdict>) -> SeverityVerdict {
    let mut level = SeverityLevel::Normal;
    let mut reasons: Vec<String> = Vec::new();

    for verdict in verdicts {
        if verdict.level > level {
            level = verdict.level;
            reasons.clear();
        }
        if verdict.level == level {
            for reason in verdict.reasons {
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }
    }

    SeverityVerdict::new(level, reasons)
}

pub fn classify_conditions(c: &Conditions, temperature_c: Option<i32>) -> SeverityVerdict {
    let visibility_m = c.visibility.map(|v| v.meters());
    let ceiling_ft = c.ceiling.feet();
    let gust_kt = c.wind.and_then(|w| w.gust_kt);
    let wind_kt = c.wind.map(|w| w.speed_kt);

    let mut critical = Vec::new();
    if visibility_m.is_some_and(|v| v <= CRITICAL_VISIBILITY_M) {
        critical.push("Low visibility");
    }
    if ceiling_ft.is_some_and(|ft| ft <= CRITICAL_CEILING_FT) {
        critical.push("Very low ceiling");
    }
    if gust_kt.is_some_and(|g| g >= CRITICAL_GUST_KT) {
        critical.push("Severe wind gusts");
    }
    if wind_kt.is_some_and(|w| w >= CRITICAL_WIND_KT) {
        critical.push("Strong sustained winds");
    }
    if c.weather.iter().any(|w| w.is_thunderstorm()) {
        critical.push("Thunderstorm activity");
    }
    if c.weather.iter().any(|w| w.is_freezing())
        || temperature_c.is_some_and(|t| t <= FREEZING_TEMPERATURE_C)
    {
        critical.push("Freezing conditions / icing risk");
    }
    if c
        .weather
        .iter()
        .any(|w| w.intensity == Intensity::Heavy && w.has_precipitation())
    {
        critical.push("Heavy precipitation");
    }
    if !critical.is_empty() {
        return SeverityVerdict::new(
            SeverityLevel::Critical,
            critical.into_iter().map(String::from).collect(),
        );
    }

    let mut caution = Vec::new();
    if visibility_m.is_some_and(|v| v <= CAUTION_VISIBILITY_M) {
        caution.push("Reduced visibility");
    }
    if ceiling_ft.is_some_and(|ft| ft <= CAUTION_CEILING_FT) {
        caution.push("Low ceiling");
    }
    if gust_kt.is_some_and(|g| g >= CAUTION_GUST_KT) {
        caution.push("Strong wind gusts");
    }
    if wind_kt.is_some_and(|w| w >= CAUTION_WIND_KT) {
        caution.push("Moderate to strong winds");
    }
    if c.weather.iter().any(|w| {
        matches!(w.intensity, Intensity::Light | Intensity::Moderate) && w.has_precipitation()
    }) {
        caution.push("Precipitation present");
    }
    if !caution.is_empty() {
        return SeverityVerdict::new(
            SeverityLevel::Caution,
            caution.into_iter().map(String::from).collect(),
        );
    }

    SeverityVerdict::normal()
}

// ---------------------------------------------------------------------------
// Flight category
// ---------------------------------------------------------------------------

/// FAA flight category from ceiling and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

/// `None` when the conditions carry neither visibility nor sky information.
pub fn flight_category(c: &Conditions) -> Option<FlightCategory> {
    if c.visibility.is_none() && c.clouds.is_empty() && !c.sky_clear && !c.cavok {
        return None;
    }
    let vis_sm = c.visibility.map(|v| v.statute_miles()).unwrap_or(f64::MAX);
    let ceiling = c.ceiling.feet().unwrap_or(u32::MAX);

    Some(if ceiling < 500 || vis_sm < 1.0 {
        FlightCategory::Lifr
    } else if ceiling < 1000 || vis_sm < 3.0 {
        FlightCategory::Ifr
    } else if ceiling <= 3000 || vis_sm <= 5.0 {
        FlightCategory::Mvfr
    } else {
        FlightCategory::Vfr
    })
}

// ---------------------------------------------------------------------------
// NOTAM severity
// ---------------------------------------------------------------------------

/// Severity of a NOTAM from its text: closures are critical, outages and
/// obstacles are caution.
pub fn classify_notam(text: &str) -> SeverityLevel {
    let t = text.to_ascii_uppercase();
    let closed = t.contains("CLSD") || t.contains("CLOSED");
    let words: Vec<&str> = t.split_whitespace().collect();

    if t.contains("AD CLSD") || t.contains("AERODROME CLOSED") || runway_closed(&words) {
        return SeverityLevel::Critical;
    }

    if t.contains("U/S")
        || t.contains("OUT OF SERVICE")
        || t.contains("UNSERVICEABLE")
        || t.contains("OBST")
        || t.contains("LGT")
        || (closed && (t.contains("TWY") || t.contains("TAXIWAY")))
    {
        return SeverityLevel::Caution;
    }

    SeverityLevel::Normal
}

/// "RWY 04L/22R CLSD": the closure has to follow the runway designator.
fn runway_closed(words: &[&str]) -> bool {
    words.windows(3).any(|w| {
        matches!(w[0], "RWY" | "RUNWAY")
            && w[1].starts_with(|c: char| c.is_ascii_digit())
            && w[1].chars().all(|c| c.is_ascii_alphanumeric() || c == '/')
            && matches!(w[2], "CLSD" | "CLOSED")
    })
}
