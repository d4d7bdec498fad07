//! METAR / TAF decoder.
//!
//! Walks the whitespace-separated groups of a coded report and turns them
//! into structured fields plus a plain-language summary. Decoding is pure:
//! the same text always yields the same `DecodedReport`.
//!
//! A TAF decodes into an initial-conditions block and zero or more change
//! periods (FM, BECMG, TEMPO, PROBnn, PROBnn TEMPO), each carrying a
//! `Conditions` value with the same field model as a METAR.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::helpers::{kmh_to_knots, mps_to_knots, statute_miles_to_meters};
use crate::models::ReportKind;

/// Weather descriptors (the two letters before the phenomenon codes).
const DESCRIPTORS: [&str; 8] = ["MI", "PR", "BC", "DR", "BL", "SH", "TS", "FZ"];

/// Precipitation, obscuration and other phenomenon codes.
const PHENOMENA: [&str; 22] = [
    "DZ", "RA", "SN", "SG", "IC", "PL", "GR", "GS", "UP", "BR", "FG", "FU", "VA", "DU", "SA",
    "HZ", "PY", "PO", "SQ", "FC", "SS", "DS",
];

/// The subset of `PHENOMENA` that counts as precipitation.
pub const PRECIPITATION_CODES: [&str; 9] = ["DZ", "RA", "SN", "SG", "IC", "PL", "GR", "GS", "UP"];

/// Visibility reported for CAVOK and for "9999" (10 km or more).
const TEN_KM_OR_MORE_M: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Raised when report text does not match the METAR or TAF grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("report text is empty")]
    Empty,

    #[error("missing station identifier in '{raw}'")]
    MissingStation { raw: String },

    #[error("missing TAF validity period in '{raw}'")]
    MissingValidity { raw: String },

    #[error("report is marked NIL: '{raw}'")]
    NilReport { raw: String },

    #[error("malformed group '{group}' in '{raw}'")]
    MalformedGroup { group: String, raw: String },
}

// ---------------------------------------------------------------------------
// Decoded field model
// ---------------------------------------------------------------------------

/// Day-of-month and UTC time as written in a report (e.g. "121251Z").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayTime {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

/// Validity window of a TAF or one of its change periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidityWindow {
    pub from: DayTime,
    /// End of validity; `None` only while an FM period's end is unknown
    pub to: Option<DayTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindDirection {
    /// True direction the wind blows from, in degrees
    Degrees(u16),
    Variable,
}

/// Surface wind, all speeds in knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Wind {
    pub direction: WindDirection,
    pub speed_kt: u16,
    pub gust_kt: Option<u16>,
    /// Start of a variable-direction sector ("dddVddd")
    pub variable_from: Option<u16>,
    /// End of a variable-direction sector
    pub variable_to: Option<u16>,
}

impl Wind {
    pub fn is_calm(&self) -> bool {
        self.speed_kt == 0 && self.gust_kt.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityUnit {
    Meters,
    StatuteMiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityQualifier {
    LessThan,
    GreaterThan,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Visibility {
    pub value: f64,
    pub unit: VisibilityUnit,
    pub qualifier: Option<VisibilityQualifier>,
}

impl Visibility {
    /// Visibility in meters; statute miles are converted at 1609.34 m/SM.
    pub fn meters(&self) -> f64 {
        match self.unit {
            VisibilityUnit::Meters => self.value,
            VisibilityUnit::StatuteMiles => statute_miles_to_meters(self.value),
        }
    }

    /// Visibility in statute miles.
    pub fn statute_miles(&self) -> f64 {
        match self.unit {
            VisibilityUnit::Meters => self.value / crate::helpers::METERS_PER_STATUTE_MILE,
            VisibilityUnit::StatuteMiles => self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
    Vicinity,
}

/// One present-weather group, e.g. "+TSRA" or "-FZDZ".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeatherPhenomenon {
    pub intensity: Intensity,
    /// Descriptor code (TS, SH, FZ, ...)
    pub descriptor: Option<String>,
    /// Precipitation / obscuration codes in report order
    pub codes: Vec<String>,
    /// The group as written
    pub raw: String,
}

impl WeatherPhenomenon {
    pub fn has_precipitation(&self) -> bool {
        self.codes
            .iter()
            .any(|c| PRECIPITATION_CODES.contains(&c.as_str()))
    }

    pub fn is_thunderstorm(&self) -> bool {
        self.descriptor.as_deref() == Some("TS")
    }

    pub fn is_freezing(&self) -> bool {
        self.descriptor.as_deref() == Some("FZ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CloudCoverage {
    Few,
    Scattered,
    Broken,
    Overcast,
    VerticalVisibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CloudLayer {
    pub coverage: CloudCoverage,
    /// Base above ground level in feet; `None` when reported as "///"
    pub base_ft: Option<u32>,
    /// Convective type: "CB" or "TCU"
    pub cloud_type: Option<String>,
}

/// Lowest broken or overcast layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Ceiling {
    Feet(u32),
    Unlimited,
}

impl Ceiling {
    pub fn feet(&self) -> Option<u32> {
        match self {
            Ceiling::Feet(ft) => Some(*ft),
            Ceiling::Unlimited => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    InHg,
    Hpa,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Altimeter {
    pub value: f64,
    pub unit: PressureUnit,
}

/// Fields shared by a METAR body, a TAF's initial block and each change period.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Conditions {
    pub wind: Option<Wind>,
    pub visibility: Option<Visibility>,
    /// Ceiling and visibility OK
    pub cavok: bool,
    pub weather: Vec<WeatherPhenomenon>,
    /// "NSW": forecast end of significant weather
    pub no_significant_weather: bool,
    pub clouds: Vec<CloudLayer>,
    /// SKC / CLR / NSC / NCD
    pub sky_clear: bool,
    pub ceiling: Ceiling,
    /// Runway visual range groups as written (e.g. "R04R/P6000FT")
    pub runway_visual_range: Vec<String>,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            wind: None,
            visibility: None,
            cavok: false,
            weather: Vec::new(),
            no_significant_weather: false,
            clouds: Vec::new(),
            sky_clear: false,
            ceiling: Ceiling::Unlimited,
            runway_visual_range: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    /// FMddhhmm: conditions replace everything before
    From,
    /// BECMG: gradual change during the window
    Becoming,
    /// TEMPO (or INTER): temporary fluctuations
    Temporary,
    /// PROBnn
    Probability { percent: u8 },
    /// PROBnn TEMPO
    ProbabilityTemporary { percent: u8 },
}

/// One TAF change period.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastPeriod {
    pub change: ChangeKind,
    pub validity: ValidityWindow,
    pub conditions: Conditions,
}

/// Structured form of a METAR or TAF.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DecodedReport {
    pub kind: ReportKind,
    /// Station ICAO code
    pub station: String,
    /// Observation (METAR) or issue (TAF) time
    pub issued: Option<DayTime>,
    /// AUTO / COR / AMD / RTD
    pub modifier: Option<String>,
    /// METAR body, or a TAF's initial conditions
    pub conditions: Conditions,
    pub temperature_c: Option<i32>,
    pub dew_point_c: Option<i32>,
    pub altimeter: Option<Altimeter>,
    /// TAF overall validity
    pub validity: Option<ValidityWindow>,
    /// TAF TX group
    pub max_temperature_c: Option<i32>,
    /// TAF TN group
    pub min_temperature_c: Option<i32>,
    /// TAF change periods, in report order
    pub periods: Vec<ForecastPeriod>,
    /// METAR trend groups as written (NOSIG, TEMPO ..., BECMG ...)
    pub trend: Option<String>,
    /// Everything after RMK
    pub remarks: Option<String>,
    pub raw_text: String,
    /// Plain-language summary
    pub summary: String,
}

impl DecodedReport {
    /// Initial conditions followed by every change period.
    pub fn all_conditions(&self) -> impl Iterator<Item = &Conditions> {
        std::iter::once(&self.conditions).chain(self.periods.iter().map(|p| &p.conditions))
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a raw METAR or TAF.
pub fn decode(raw_text: &str, kind: ReportKind) -> Result<DecodedReport, DecodeError> {
    let raw = raw_text.trim().trim_end_matches('=').trim();
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }

    let all: Vec<&str> = raw
        .split_whitespace()
        .map(|t| t.trim_end_matches('='))
        .filter(|t| !t.is_empty())
        .collect();
    let (body, remarks) = match all.iter().position(|t| *t == "RMK") {
        Some(idx) => {
            let remarks = all[idx + 1..].join(" ");
            (
                all[..idx].to_vec(),
                if remarks.is_empty() {
                    None
                } else {
                    Some(remarks)
                },
            )
        }
        None => (all, None),
    };

    let mut parser = Parser {
        raw,
        tokens: body,
        pos: 0,
    };

    let mut report = DecodedReport {
        kind,
        station: String::new(),
        issued: None,
        modifier: None,
        conditions: Conditions::default(),
        temperature_c: None,
        dew_point_c: None,
        altimeter: None,
        validity: None,
        max_temperature_c: None,
        min_temperature_c: None,
        periods: Vec::new(),
        trend: None,
        remarks,
        raw_text: raw.to_string(),
        summary: String::new(),
    };

    parser.parse_header(&mut report)?;

    let mut observed = Observed::default();
    let mut conditions = Conditions::default();
    parser.parse_conditions(&mut conditions, &mut observed)?;
    report.conditions = conditions;

    match kind {
        ReportKind::Metar => {
            let trend = parser.remaining().join(" ");
            if !trend.is_empty() {
                report.trend = Some(trend);
            }
        }
        ReportKind::Taf => {
            report.periods = parser.parse_change_periods(&mut observed)?;
            close_from_periods(&mut report.periods, report.validity.and_then(|v| v.to));
        }
    }

    report.temperature_c = observed.temperature_c;
    report.dew_point_c = observed.dew_point_c;
    report.altimeter = observed.altimeter;
    report.max_temperature_c = observed.max_temperature_c;
    report.min_temperature_c = observed.min_temperature_c;
    report.summary = summarize(&report);

    Ok(report)
}

/// Report-level values that may appear inside any conditions block.
#[derive(Debug, Default)]
struct Observed {
    temperature_c: Option<i32>,
    dew_point_c: Option<i32>,
    altimeter: Option<Altimeter>,
    max_temperature_c: Option<i32>,
    min_temperature_c: Option<i32>,
}

struct Parser<'a> {
    raw: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn remaining(&self) -> &[&'a str] {
        self.tokens.get(self.pos..).unwrap_or(&[])
    }

    fn malformed(&self, group: &str) -> DecodeError {
        DecodeError::MalformedGroup {
            group: group.to_string(),
            raw: self.raw.to_string(),
        }
    }

    fn parse_header(&mut self, report: &mut DecodedReport) -> Result<(), DecodeError> {
        let prefixes: &[&str] = match report.kind {
            ReportKind::Metar => &["METAR", "SPECI"],
            ReportKind::Taf => &["TAF"],
        };
        if self.peek().is_some_and(|t| prefixes.contains(&t)) {
            self.advance();
        }
        // "TAF AMD KJFK ..." / "METAR COR KJFK ..."
        if let Some(m @ ("AMD" | "COR")) = self.peek() {
            report.modifier = Some(m.to_string());
            self.advance();
        }

        match self.peek() {
            Some(station) if is_station(station) => {
                report.station = station.to_string();
                self.advance();
            }
            _ => {
                return Err(DecodeError::MissingStation {
                    raw: self.raw.to_string(),
                })
            }
        }

        if let Some(tok) = self.peek() {
            if tok.len() == 7 && tok.ends_with('Z') {
                let issued = parse_day_time(&tok[..6])
                    .filter(|t| t.hour < 24)
                    .ok_or_else(|| self.malformed(tok))?;
                report.issued = Some(issued);
                self.advance();
            }
        }

        while let Some(tok) = self.peek() {
            match tok {
                "AUTO" | "COR" | "AMD" | "RTD" => {
                    report.modifier = Some(tok.to_string());
                    self.advance();
                }
                "NIL" => {
                    return Err(DecodeError::NilReport {
                        raw: self.raw.to_string(),
                    })
                }
                _ => break,
            }
        }

        if report.kind == ReportKind::Taf {
            match self.peek().and_then(parse_validity) {
                Some(validity) => {
                    report.validity = Some(validity);
                    self.advance();
                }
                None => {
                    return Err(DecodeError::MissingValidity {
                        raw: self.raw.to_string(),
                    })
                }
            }
            // "TAF KJFK 121130Z 1212/1318 NIL"
            if self.peek() == Some("NIL") {
                return Err(DecodeError::NilReport {
                    raw: self.raw.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Consume condition groups until a change marker or the end of the body.
    fn parse_conditions(
        &mut self,
        conditions: &mut Conditions,
        observed: &mut Observed,
    ) -> Result<(), DecodeError> {
        while let Some(tok) = self.peek() {
            if is_change_marker(tok) {
                break;
            }
            self.advance();

            if tok.chars().all(|c| c == '/') {
                continue;
            }

            if let Some(wind) = parse_wind(tok) {
                conditions.wind = wind.map_err(|_| self.malformed(tok))?;
                continue;
            }

            if let Some((from, to)) = parse_wind_variation(tok) {
                if let Some(wind) = conditions.wind.as_mut() {
                    wind.variable_from = Some(from);
                    wind.variable_to = Some(to);
                }
                continue;
            }

            if tok == "CAVOK" {
                conditions.cavok = true;
                conditions.visibility = Some(Visibility {
                    value: TEN_KM_OR_MORE_M,
                    unit: VisibilityUnit::Meters,
                    qualifier: Some(VisibilityQualifier::GreaterThan),
                });
                continue;
            }

            if let Some(vis) = parse_visibility_meters(tok) {
                // A second metric group is a directional minimum.
                if conditions.visibility.is_none() {
                    conditions.visibility = Some(vis);
                }
                continue;
            }

            if let Some(body) = tok.strip_suffix("SM") {
                let vis = parse_statute_miles(body, 0.0).ok_or_else(|| self.malformed(tok))?;
                conditions.visibility = Some(vis);
                continue;
            }

            // Whole part of a mixed visibility, e.g. "1 1/2SM"
            if tok.len() <= 2 && tok.chars().all(|c| c.is_ascii_digit()) {
                let fraction = self
                    .peek()
                    .and_then(|next| next.strip_suffix("SM"))
                    .filter(|body| body.contains('/'));
                let whole: f64 = tok.parse().map_err(|_| self.malformed(tok))?;
                match fraction.and_then(|body| parse_statute_miles(body, whole)) {
                    Some(vis) => {
                        conditions.visibility = Some(vis);
                        self.advance();
                        continue;
                    }
                    None => return Err(self.malformed(tok)),
                }
            }

            if is_runway_visual_range(tok) {
                conditions.runway_visual_range.push(tok.to_string());
                continue;
            }

            if matches!(tok, "SKC" | "CLR" | "NSC" | "NCD") {
                conditions.sky_clear = true;
                continue;
            }

            if let Some(layer) = parse_cloud_layer(tok) {
                let layer = layer.map_err(|_| self.malformed(tok))?;
                conditions.clouds.push(layer);
                continue;
            }

            if matches!(tok, "CB" | "TCU") {
                match conditions.clouds.last_mut() {
                    Some(layer) if layer.cloud_type.is_none() => {
                        layer.cloud_type = Some(tok.to_string());
                        continue;
                    }
                    _ => return Err(self.malformed(tok)),
                }
            }

            if tok == "NSW" {
                conditions.no_significant_weather = true;
                continue;
            }

            // Recent weather ("RERA") is informational only.
            if tok.len() > 2 && tok.starts_with("RE") && parse_weather(&tok[2..]).is_some() {
                continue;
            }

            if tok == "WS" {
                self.skip_wind_shear();
                continue;
            }
            if tok.starts_with("WS") && tok[2..].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }

            if let Some(phenomenon) = parse_weather(tok) {
                conditions.weather.push(phenomenon);
                continue;
            }

            if let Some((is_max, temp)) = parse_forecast_temperature(tok) {
                if is_max {
                    observed.max_temperature_c = Some(temp);
                } else {
                    observed.min_temperature_c = Some(temp);
                }
                continue;
            }

            if let Some((temp, dew)) = parse_temperature_pair(tok) {
                observed.temperature_c = Some(temp);
                observed.dew_point_c = dew;
                continue;
            }

            if let Some(altimeter) = parse_altimeter(tok) {
                observed.altimeter = Some(altimeter);
                continue;
            }
            if matches!(tok, "A////" | "Q////") {
                continue;
            }

            return Err(self.malformed(tok));
        }

        conditions.ceiling = derive_ceiling(&conditions.clouds);
        Ok(())
    }

    /// "WS R04R" or "WS ALL RWY"
    fn skip_wind_shear(&mut self) {
        match self.peek() {
            Some("ALL") => {
                self.advance();
                if self.peek() == Some("RWY") {
                    self.advance();
                }
            }
            Some(rwy) if rwy.starts_with('R') => self.advance(),
            _ => {}
        }
    }

    fn parse_change_periods(
        &mut self,
        observed: &mut Observed,
    ) -> Result<Vec<ForecastPeriod>, DecodeError> {
        let mut periods = Vec::new();

        while let Some(tok) = self.peek() {
            self.advance();

            let (change, validity) = if let Some(from) = parse_from_group(tok) {
                (ChangeKind::From, ValidityWindow { from, to: None })
            } else if tok == "NOSIG" {
                continue;
            } else {
                let change = match tok {
                    "TEMPO" | "INTER" => ChangeKind::Temporary,
                    "BECMG" => ChangeKind::Becoming,
                    _ => {
                        let percent = parse_probability(tok).ok_or_else(|| self.malformed(tok))?;
                        if self.peek() == Some("TEMPO") {
                            self.advance();
                            ChangeKind::ProbabilityTemporary { percent }
                        } else {
                            ChangeKind::Probability { percent }
                        }
                    }
                };
                let validity = self
                    .peek()
                    .and_then(parse_validity)
                    .ok_or_else(|| self.malformed(tok))?;
                self.advance();
                (change, validity)
            };

            let mut conditions = Conditions::default();
            self.parse_conditions(&mut conditions, observed)?;
            periods.push(ForecastPeriod {
                change,
                validity,
                conditions,
            });
        }

        Ok(periods)
    }
}

/// An FM period runs until the next FM period or the end of the TAF.
fn close_from_periods(periods: &mut [ForecastPeriod], taf_end: Option<DayTime>) {
    let starts: Vec<(usize, DayTime)> = periods
        .iter()
        .enumerate()
        .filter(|(_, p)| p.change == ChangeKind::From)
        .map(|(i, p)| (i, p.validity.from))
        .collect();

    for (n, (idx, _)) in starts.iter().enumerate() {
        let end = starts.get(n + 1).map(|(_, from)| *from).or(taf_end);
        periods[*idx].validity.to = end;
    }
}

fn derive_ceiling(clouds: &[CloudLayer]) -> Ceiling {
    clouds
        .iter()
        .filter(|l| matches!(l.coverage, CloudCoverage::Broken | CloudCoverage::Overcast))
        .filter_map(|l| l.base_ft)
        .min()
        .map(Ceiling::Feet)
        .unwrap_or(Ceiling::Unlimited)
}

// ---------------------------------------------------------------------------
// Group parsers
// ---------------------------------------------------------------------------

fn is_station(tok: &str) -> bool {
    tok.len() == 4
        && tok.chars().all(|c| c.is_ascii_alphanumeric())
        && tok.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn is_change_marker(tok: &str) -> bool {
    matches!(tok, "TEMPO" | "BECMG" | "NOSIG" | "INTER")
        || parse_from_group(tok).is_some()
        || parse_probability(tok).is_some()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// "ddhhmm" with day 1..=31, hour 0..=24, minute 0..=59.
fn parse_day_time(s: &str) -> Option<DayTime> {
    if s.len() != 6 || !all_digits(s) {
        return None;
    }
    let day: u8 = s[0..2].parse().ok()?;
    let hour: u8 = s[2..4].parse().ok()?;
    let minute: u8 = s[4..6].parse().ok()?;
    if !(1..=31).contains(&day) || hour > 24 || minute > 59 {
        return None;
    }
    Some(DayTime { day, hour, minute })
}

/// "ddhh/ddhh"
fn parse_validity(tok: &str) -> Option<ValidityWindow> {
    let (from, to) = tok.split_once('/')?;
    if from.len() != 4 || to.len() != 4 {
        return None;
    }
    Some(ValidityWindow {
        from: parse_day_time(&format!("{}00", from))?,
        to: Some(parse_day_time(&format!("{}00", to))?),
    })
}

/// "FMddhhmm"
fn parse_from_group(tok: &str) -> Option<DayTime> {
    tok.strip_prefix("FM").and_then(parse_day_time)
}

/// "PROB30" / "PROB40"
fn parse_probability(tok: &str) -> Option<u8> {
    let pct = tok.strip_prefix("PROB")?;
    if pct.len() != 2 || !all_digits(pct) {
        return None;
    }
    pct.parse().ok()
}

fn knots(v: f64) -> f64 {
    v
}

/// `None` if `tok` is not a wind group, `Some(Ok(None))` for "/////KT".
fn parse_wind(tok: &str) -> Option<Result<Option<Wind>, ()>> {
    let (body, to_knots): (&str, fn(f64) -> f64) = if let Some(b) = tok.strip_suffix("KT") {
        (b, knots)
    } else if let Some(b) = tok.strip_suffix("MPS") {
        (b, mps_to_knots)
    } else if let Some(b) = tok.strip_suffix("KMH") {
        (b, kmh_to_knots)
    } else {
        return None;
    };

    let first = body.chars().next()?;
    if !(first.is_ascii_digit() || first == '/' || body.starts_with("VRB")) {
        return None;
    }
    if body.chars().all(|c| c == '/') {
        return Some(Ok(None));
    }
    Some(decode_wind_body(body, to_knots).map(Some).ok_or(()))
}

fn decode_wind_body(body: &str, to_knots: fn(f64) -> f64) -> Option<Wind> {
    if !body.is_ascii() || body.len() < 5 {
        return None;
    }
    let (dir, rest) = body.split_at(3);
    let direction = if dir == "VRB" {
        WindDirection::Variable
    } else {
        if !all_digits(dir) {
            return None;
        }
        let degrees: u16 = dir.parse().ok()?;
        if degrees > 360 {
            return None;
        }
        WindDirection::Degrees(degrees)
    };

    let (speed, gust) = match rest.split_once('G') {
        Some((s, g)) => (s, Some(g)),
        None => (rest, None),
    };
    let convert = |s: &str| -> Option<u16> {
        if !(2..=3).contains(&s.len()) || !all_digits(s) {
            return None;
        }
        let raw: f64 = s.parse().ok()?;
        Some(to_knots(raw).round() as u16)
    };

    Some(Wind {
        direction,
        speed_kt: convert(speed)?,
        gust_kt: match gust {
            Some(g) => Some(convert(g)?),
            None => None,
        },
        variable_from: None,
        variable_to: None,
    })
}

/// "dddVddd"
fn parse_wind_variation(tok: &str) -> Option<(u16, u16)> {
    if tok.len() != 7 || !tok.is_ascii() || &tok[3..4] != "V" {
        return None;
    }
    let (from, to) = (&tok[..3], &tok[4..]);
    if !all_digits(from) || !all_digits(to) {
        return None;
    }
    Some((from.parse().ok()?, to.parse().ok()?))
}

/// "dddd", "ddddNDV" or "ddddNE" style metric visibility.
fn parse_visibility_meters(tok: &str) -> Option<Visibility> {
    if !tok.is_ascii() {
        return None;
    }
    let digits = tok.get(..4)?;
    if !all_digits(digits) {
        return None;
    }
    let suffix = &tok[4..];
    if !matches!(
        suffix,
        "" | "NDV" | "N" | "NE" | "E" | "SE" | "S" | "SW" | "W" | "NW"
    ) {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    Some(if value >= 9999.0 {
        Visibility {
            value: TEN_KM_OR_MORE_M,
            unit: VisibilityUnit::Meters,
            qualifier: Some(VisibilityQualifier::GreaterThan),
        }
    } else {
        Visibility {
            value,
            unit: VisibilityUnit::Meters,
            qualifier: None,
        }
    })
}

/// Statute-mile body without the "SM" suffix: "10", "1/2", "M1/4", "P6".
/// `whole` carries the integer part of a mixed number written as two groups.
fn parse_statute_miles(body: &str, whole: f64) -> Option<Visibility> {
    let (qualifier, number) = if let Some(n) = body.strip_prefix('M') {
        (Some(VisibilityQualifier::LessThan), n)
    } else if let Some(n) = body.strip_prefix('P') {
        (Some(VisibilityQualifier::GreaterThan), n)
    } else {
        (None, body)
    };

    let value = match number.split_once('/') {
        Some((num, den)) => {
            if !all_digits(num) || !all_digits(den) {
                return None;
            }
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => {
            if whole != 0.0 || !all_digits(number) {
                return None;
            }
            number.parse().ok()?
        }
    };

    Some(Visibility {
        value: whole + value,
        unit: VisibilityUnit::StatuteMiles,
        qualifier,
    })
}

/// "R04R/P6000FT", "R27/0600V1000U"
fn is_runway_visual_range(tok: &str) -> bool {
    tok.is_ascii()
        && tok.len() >= 5
        && tok.starts_with('R')
        && tok.contains('/')
        && tok[1..3].chars().all(|c| c.is_ascii_digit())
}

/// `None` if `tok` is not a cloud group.
fn parse_cloud_layer(tok: &str) -> Option<Result<CloudLayer, ()>> {
    let (coverage, rest) = if let Some(r) = tok.strip_prefix("FEW") {
        (CloudCoverage::Few, r)
    } else if let Some(r) = tok.strip_prefix("SCT") {
        (CloudCoverage::Scattered, r)
    } else if let Some(r) = tok.strip_prefix("BKN") {
        (CloudCoverage::Broken, r)
    } else if let Some(r) = tok.strip_prefix("OVC") {
        (CloudCoverage::Overcast, r)
    } else if let Some(r) = tok.strip_prefix("VV") {
        (CloudCoverage::VerticalVisibility, r)
    } else {
        return None;
    };

    let Some(height) = rest.get(..3) else {
        return Some(Err(()));
    };
    let base_ft = if height == "///" {
        None
    } else if all_digits(height) {
        match height.parse::<u32>() {
            Ok(h) => Some(h * 100),
            Err(_) => return Some(Err(())),
        }
    } else {
        return Some(Err(()));
    };

    let cloud_type = match &rest[3..] {
        "" | "///" => None,
        t @ ("CB" | "TCU") => Some(t.to_string()),
        _ => return Some(Err(())),
    };

    Some(Ok(CloudLayer {
        coverage,
        base_ft,
        cloud_type,
    }))
}

fn parse_weather(tok: &str) -> Option<WeatherPhenomenon> {
    if !tok.is_ascii() || tok.is_empty() {
        return None;
    }
    let (intensity, rest) = if let Some(r) = tok.strip_prefix('+') {
        (Intensity::Heavy, r)
    } else if let Some(r) = tok.strip_prefix('-') {
        (Intensity::Light, r)
    } else if let Some(r) = tok.strip_prefix("VC") {
        (Intensity::Vicinity, r)
    } else {
        (Intensity::Moderate, tok)
    };

    let (descriptor, rest) = match rest.get(..2) {
        Some(d) if DESCRIPTORS.contains(&d) => (Some(d.to_string()), &rest[2..]),
        _ => (None, rest),
    };

    if rest.len() % 2 != 0 {
        return None;
    }
    let mut codes = Vec::with_capacity(rest.len() / 2);
    for i in (0..rest.len()).step_by(2) {
        let code = &rest[i..i + 2];
        if !PHENOMENA.contains(&code) {
            return None;
        }
        codes.push(code.to_string());
    }
    if codes.is_empty() && descriptor.is_none() {
        return None;
    }

    Some(WeatherPhenomenon {
        intensity,
        descriptor,
        codes,
        raw: tok.to_string(),
    })
}

/// "24", "M05"
fn parse_signed_temperature(s: &str) -> Option<i32> {
    let (negative, digits) = match s.strip_prefix('M') {
        Some(d) => (true, d),
        None => (false, s),
    };
    if digits.len() != 2 || !all_digits(digits) {
        return None;
    }
    let value: i32 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// "24/18", "M05/M08", "15/"
fn parse_temperature_pair(tok: &str) -> Option<(i32, Option<i32>)> {
    let (temp, dew) = tok.split_once('/')?;
    let temp = parse_signed_temperature(temp)?;
    let dew = if dew.is_empty() || dew == "//" {
        None
    } else {
        Some(parse_signed_temperature(dew)?)
    };
    Some((temp, dew))
}

/// "TX25/1220Z" / "TNM02/1306Z"; returns (is_max, temperature).
fn parse_forecast_temperature(tok: &str) -> Option<(bool, i32)> {
    let (is_max, rest) = if let Some(r) = tok.strip_prefix("TX") {
        (true, r)
    } else if let Some(r) = tok.strip_prefix("TN") {
        (false, r)
    } else {
        return None;
    };
    let (temp, time) = rest.split_once('/')?;
    if !time.ends_with('Z') {
        return None;
    }
    Some((is_max, parse_signed_temperature(temp)?))
}

/// "A3000" (inHg × 100), "Q1013" (hPa), "QNH2992INS"
fn parse_altimeter(tok: &str) -> Option<Altimeter> {
    if let Some(ins) = tok
        .strip_prefix("QNH")
        .and_then(|r| r.strip_suffix("INS"))
    {
        if ins.len() == 4 && all_digits(ins) {
            let hundredths: f64 = ins.parse().ok()?;
            return Some(Altimeter {
                value: hundredths / 100.0,
                unit: PressureUnit::InHg,
            });
        }
        return None;
    }

    let (unit, digits) = if let Some(d) = tok.strip_prefix('A') {
        (PressureUnit::InHg, d)
    } else if let Some(d) = tok.strip_prefix('Q') {
        (PressureUnit::Hpa, d)
    } else {
        return None;
    };
    if digits.len() != 4 || !all_digits(digits) {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    Some(Altimeter {
        value: match unit {
            PressureUnit::InHg => value / 100.0,
            PressureUnit::Hpa => value,
        },
        unit,
    })
}

// ---------------------------------------------------------------------------
// Plain-language summary
// ---------------------------------------------------------------------------

const NOT_REPORTED: &str = "not reported";

/// Build the summary: station/time, wind, visibility, weather, clouds,
/// temperature, pressure, then TAF change periods. Absent fields render as
/// "not reported" so summaries stay structurally comparable.
pub fn summarize(report: &DecodedReport) -> String {
    let mut clauses = vec![describe_header(report)];
    clauses.extend(describe_conditions(&report.conditions));

    let temperature = match (report.temperature_c, report.dew_point_c) {
        (Some(t), Some(d)) => format!("{}°C, dew point {}°C", t, d),
        (Some(t), None) => format!("{}°C, dew point {}", t, NOT_REPORTED),
        (None, _) => match (report.max_temperature_c, report.min_temperature_c) {
            (Some(max), Some(min)) => format!("forecast high {}°C, low {}°C", max, min),
            (Some(max), None) => format!("forecast high {}°C", max),
            (None, Some(min)) => format!("forecast low {}°C", min),
            (None, None) => NOT_REPORTED.to_string(),
        },
    };
    clauses.push(format!("Temperature: {}", temperature));

    let pressure = report
        .altimeter
        .map(|a| match a.unit {
            PressureUnit::InHg => format!("{:.2} inHg", a.value),
            PressureUnit::Hpa => format!("{:.0} hPa", a.value),
        })
        .unwrap_or_else(|| NOT_REPORTED.to_string());
    clauses.push(format!("Pressure: {}", pressure));

    if !report.periods.is_empty() {
        let changes: Vec<String> = report.periods.iter().map(describe_period).collect();
        clauses.push(format!("Forecast changes: {}", changes.join("; ")));
    }

    let mut summary = clauses.join(". ");
    summary.push('.');
    summary
}

fn describe_day_time(t: &DayTime) -> String {
    format!("day {} at {:02}:{:02} UTC", t.day, t.hour, t.minute)
}

fn describe_header(report: &DecodedReport) -> String {
    let kind = match report.kind {
        ReportKind::Metar => "METAR",
        ReportKind::Taf => "TAF",
    };
    let mut header = format!("{} for {}", kind, report.station);
    if let Some(issued) = &report.issued {
        let verb = match report.kind {
            ReportKind::Metar => "observed",
            ReportKind::Taf => "issued",
        };
        header.push_str(&format!(", {} {}", verb, describe_day_time(issued)));
    }
    if let Some(validity) = &report.validity {
        header.push_str(&format!(", valid {}", describe_validity(validity)));
    }
    header
}

fn describe_validity(v: &ValidityWindow) -> String {
    match &v.to {
        Some(to) => format!(
            "from {} to {}",
            describe_day_time(&v.from),
            describe_day_time(to)
        ),
        None => format!("from {}", describe_day_time(&v.from)),
    }
}

/// Wind, visibility, weather and cloud clauses.
fn describe_conditions(c: &Conditions) -> Vec<String> {
    let wind = c
        .wind
        .as_ref()
        .map(describe_wind)
        .unwrap_or_else(|| NOT_REPORTED.to_string());

    let visibility = match &c.visibility {
        Some(_) if c.cavok => "10 km or more (CAVOK)".to_string(),
        Some(v) => describe_visibility(v),
        None => NOT_REPORTED.to_string(),
    };

    let weather = if !c.weather.is_empty() {
        c.weather
            .iter()
            .map(describe_weather)
            .collect::<Vec<_>>()
            .join(", ")
    } else if c.no_significant_weather {
        "no significant weather".to_string()
    } else {
        NOT_REPORTED.to_string()
    };

    let clouds = if !c.clouds.is_empty() {
        c.clouds
            .iter()
            .map(describe_cloud)
            .collect::<Vec<_>>()
            .join(", ")
    } else if c.sky_clear {
        "sky clear".to_string()
    } else if c.cavok {
        "no significant cloud".to_string()
    } else {
        NOT_REPORTED.to_string()
    };

    vec![
        format!("Wind: {}", wind),
        format!("Visibility: {}", visibility),
        format!("Weather: {}", weather),
        format!("Clouds: {}", clouds),
    ]
}

pub fn describe_wind(w: &Wind) -> String {
    if w.is_calm() {
        return "calm".to_string();
    }
    let mut text = match w.direction {
        WindDirection::Degrees(d) => format!("{}° at {} knots", d, w.speed_kt),
        WindDirection::Variable => format!("variable at {} knots", w.speed_kt),
    };
    if let Some(gust) = w.gust_kt {
        text.push_str(&format!(", gusting to {} knots", gust));
    }
    if let (Some(from), Some(to)) = (w.variable_from, w.variable_to) {
        text.push_str(&format!(", varying between {}° and {}°", from, to));
    }
    text
}

fn format_number(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn describe_visibility(v: &Visibility) -> String {
    let base = match v.unit {
        VisibilityUnit::Meters if v.value >= TEN_KM_OR_MORE_M => {
            return "10 km or more".to_string();
        }
        VisibilityUnit::Meters => format!("{} meters", format_number(v.value)),
        VisibilityUnit::StatuteMiles if v.value == 1.0 => "1 statute mile".to_string(),
        VisibilityUnit::StatuteMiles => format!("{} statute miles", format_number(v.value)),
    };
    match v.qualifier {
        Some(VisibilityQualifier::LessThan) => format!("less than {}", base),
        Some(VisibilityQualifier::GreaterThan) => format!("more than {}", base),
        None => base,
    }
}

fn phenomenon_name(code: &str) -> &'static str {
    match code {
        "DZ" => "drizzle",
        "RA" => "rain",
        "SN" => "snow",
        "SG" => "snow grains",
        "IC" => "ice crystals",
        "PL" => "ice pellets",
        "GR" => "hail",
        "GS" => "small hail",
        "UP" => "unknown precipitation",
        "BR" => "mist",
        "FG" => "fog",
        "FU" => "smoke",
        "VA" => "volcanic ash",
        "DU" => "dust",
        "SA" => "sand",
        "HZ" => "haze",
        "PY" => "spray",
        "PO" => "dust whirls",
        "SQ" => "squalls",
        "FC" => "funnel cloud",
        "SS" => "sandstorm",
        "DS" => "duststorm",
        _ => "unknown phenomenon",
    }
}

fn descriptor_name(code: &str) -> &'static str {
    match code {
        "MI" => "shallow",
        "PR" => "partial",
        "BC" => "patches of",
        "DR" => "low drifting",
        "BL" => "blowing",
        "FZ" => "freezing",
        _ => "",
    }
}

pub fn describe_weather(w: &WeatherPhenomenon) -> String {
    let codes = w
        .codes
        .iter()
        .map(|c| phenomenon_name(c))
        .collect::<Vec<_>>()
        .join(" and ");

    let core = match w.descriptor.as_deref() {
        Some("TS") if codes.is_empty() => "thunderstorm".to_string(),
        Some("TS") => format!("thunderstorm with {}", codes),
        Some("SH") if codes.is_empty() => "showers".to_string(),
        Some("SH") => format!("{} showers", codes),
        Some(d) => format!("{} {}", descriptor_name(d), codes).trim().to_string(),
        None => codes,
    };

    match w.intensity {
        Intensity::Light => format!("light {}", core),
        Intensity::Heavy => format!("heavy {}", core),
        Intensity::Moderate => core,
        Intensity::Vicinity => format!("{} in the vicinity", core),
    }
}

fn describe_cloud(layer: &CloudLayer) -> String {
    let height = layer
        .base_ft
        .map(|ft| format!("{} ft", ft))
        .unwrap_or_else(|| "unknown height".to_string());
    let mut text = match layer.coverage {
        CloudCoverage::Few => format!("few at {}", height),
        CloudCoverage::Scattered => format!("scattered at {}", height),
        CloudCoverage::Broken => format!("broken at {}", height),
        CloudCoverage::Overcast => format!("overcast at {}", height),
        CloudCoverage::VerticalVisibility => format!("vertical visibility {}", height),
    };
    match layer.cloud_type.as_deref() {
        Some("CB") => text.push_str(" (cumulonimbus)"),
        Some("TCU") => text.push_str(" (towering cumulus)"),
        _ => {}
    }
    text
}

fn describe_period(p: &ForecastPeriod) -> String {
    let label = match p.change {
        ChangeKind::From => "from".to_string(),
        ChangeKind::Becoming => "becoming".to_string(),
        ChangeKind::Temporary => "temporarily".to_string(),
        ChangeKind::Probability { percent } => format!("{}% probability", percent),
        ChangeKind::ProbabilityTemporary { percent } => {
            format!("{}% probability temporarily", percent)
        }
    };
    let details: Vec<String> = describe_conditions(&p.conditions)
        .into_iter()
        .filter(|clause| !clause.ends_with(NOT_REPORTED))
        .collect();
    format!(
        "{} {}: {}",
        label,
        describe_validity(&p.validity),
        if details.is_empty() {
            "no change reported".to_string()
        } else {
            details.join(", ")
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const KJFK_METAR: &str =
        "METAR KJFK 121251Z 28014G20KT 10SM FEW250 24/18 A3000 RMK AO2 SLP158 T02440183=";
    const KORD_METAR: &str =
        "METAR KORD 121251Z 27035G45KT 1/2SM +TSRA BKN008 OVC020 CB 15/14 A2965 RMK AO2";
    const KJFK_TAF: &str = "TAF KJFK 121130Z 1212/1318 28012KT P6SM FEW250 \
        FM121800 30015G25KT P6SM SCT050 \
        TEMPO 1220/1224 3SM TSRA BKN030CB \
        FM130200 VRB05KT P6SM SKC \
        PROB30 1306/1310 1SM BR OVC005";

    #[test]
    fn test_decode_kjfk_metar() {
        let report = decode(KJFK_METAR, ReportKind::Metar).unwrap();
        assert_eq!(report.station, "KJFK");
        assert_eq!(
            report.issued,
            Some(DayTime {
                day: 12,
                hour: 12,
                minute: 51
            })
        );

        let wind = report.conditions.wind.unwrap();
        assert_eq!(wind.direction, WindDirection::Degrees(280));
        assert_eq!(wind.speed_kt, 14);
        assert_eq!(wind.gust_kt, Some(20));
        assert_eq!(
            describe_wind(&wind),
            "280° at 14 knots, gusting to 20 knots"
        );

        let vis = report.conditions.visibility.unwrap();
        assert_eq!(vis.unit, VisibilityUnit::StatuteMiles);
        assert_eq!(vis.value, 10.0);
        assert_eq!(describe_visibility(&vis), "10 statute miles");

        assert_eq!(report.conditions.clouds.len(), 1);
        assert_eq!(report.conditions.clouds[0].base_ft, Some(25_000));
        assert_eq!(report.conditions.ceiling, Ceiling::Unlimited);
        assert_eq!(report.temperature_c, Some(24));
        assert_eq!(report.dew_point_c, Some(18));
        assert_eq!(
            report.altimeter,
            Some(Altimeter {
                value: 30.0,
                unit: PressureUnit::InHg
            })
        );
        assert_eq!(report.remarks.as_deref(), Some("AO2 SLP158 T02440183"));
        assert!(report
            .summary
            .contains("Wind: 280° at 14 knots, gusting to 20 knots"));
        assert!(report.summary.contains("Visibility: 10 statute miles"));
    }

    #[test]
    fn test_decode_kord_thunderstorm_metar() {
        let report = decode(KORD_METAR, ReportKind::Metar).unwrap();
        let c = &report.conditions;

        assert_eq!(c.wind.unwrap().gust_kt, Some(45));
        assert_eq!(c.visibility.unwrap().value, 0.5);
        assert_eq!(c.weather.len(), 1);
        assert_eq!(c.weather[0].intensity, Intensity::Heavy);
        assert!(c.weather[0].is_thunderstorm());
        assert!(c.weather[0].has_precipitation());
        // Standalone "CB" attaches to the preceding layer
        assert_eq!(c.clouds[1].cloud_type.as_deref(), Some("CB"));
        assert_eq!(c.ceiling, Ceiling::Feet(800));
        assert!(report
            .summary
            .contains("Weather: heavy thunderstorm with rain"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let a = decode(KORD_METAR, ReportKind::Metar).unwrap();
        let b = decode(KORD_METAR, ReportKind::Metar).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_taf_periods() {
        let report = decode(KJFK_TAF, ReportKind::Taf).unwrap();
        assert_eq!(report.station, "KJFK");
        let validity = report.validity.unwrap();
        assert_eq!(validity.from.day, 12);
        assert_eq!(validity.to.unwrap().hour, 18);

        assert_eq!(report.conditions.wind.unwrap().speed_kt, 12);
        assert_eq!(report.periods.len(), 4);

        assert_eq!(report.periods[0].change, ChangeKind::From);
        assert_eq!(report.periods[0].conditions.wind.unwrap().gust_kt, Some(25));
        // First FM ends where the next FM starts
        assert_eq!(
            report.periods[0].validity.to,
            Some(DayTime {
                day: 13,
                hour: 2,
                minute: 0
            })
        );

        assert_eq!(report.periods[1].change, ChangeKind::Temporary);
        assert!(report.periods[1].conditions.weather[0].is_thunderstorm());
        assert_eq!(
            report.periods[1].conditions.clouds[0].cloud_type.as_deref(),
            Some("CB")
        );

        // Last FM runs to the end of the TAF
        assert_eq!(report.periods[2].validity.to, validity.to);
        assert!(report.periods[2].conditions.sky_clear);

        assert_eq!(
            report.periods[3].change,
            ChangeKind::Probability { percent: 30 }
        );
        assert_eq!(report.periods[3].conditions.ceiling, Ceiling::Feet(500));
        assert!(report.summary.contains("Forecast changes:"));
    }

    #[test]
    fn test_decode_taf_prob_tempo_and_temperatures() {
        let raw = "TAF EGLL 121100Z 1212/1318 24010KT 9999 SCT035 TX18/1215Z TN09/1305Z \
            PROB40 TEMPO 1214/1218 4000 SHRA BECMG 1300/1303 VRB03KT";
        let report = decode(raw, ReportKind::Taf).unwrap();
        assert_eq!(report.max_temperature_c, Some(18));
        assert_eq!(report.min_temperature_c, Some(9));
        assert_eq!(
            report.periods[0].change,
            ChangeKind::ProbabilityTemporary { percent: 40 }
        );
        assert_eq!(report.periods[1].change, ChangeKind::Becoming);
        assert!(report.summary.contains("forecast high 18°C, low 9°C"));
    }

    #[test]
    fn test_decode_mixed_fraction_visibility() {
        let report = decode(
            "METAR KBOS 121254Z 05008KT 1 1/2SM -SN BR OVC008 M02/M04 A2992",
            ReportKind::Metar,
        )
        .unwrap();
        let vis = report.conditions.visibility.unwrap();
        assert_eq!(vis.value, 1.5);
        assert_eq!(report.temperature_c, Some(-2));
        assert_eq!(report.dew_point_c, Some(-4));
        assert_eq!(report.conditions.weather.len(), 2);
        assert_eq!(report.conditions.weather[0].intensity, Intensity::Light);
    }

    #[test]
    fn test_decode_metric_cavok_and_hpa() {
        let report = decode(
            "METAR LSZH 121250Z AUTO 24008KT 200V280 CAVOK 18/09 Q1021 NOSIG",
            ReportKind::Metar,
        )
        .unwrap();
        assert_eq!(report.modifier.as_deref(), Some("AUTO"));
        let wind = report.conditions.wind.unwrap();
        assert_eq!(wind.variable_from, Some(200));
        assert_eq!(wind.variable_to, Some(280));
        assert!(report.conditions.cavok);
        assert_eq!(report.conditions.visibility.unwrap().meters(), 10_000.0);
        assert_eq!(report.altimeter.unwrap().unit, PressureUnit::Hpa);
        assert_eq!(report.trend.as_deref(), Some("NOSIG"));
        assert!(report.summary.contains("10 km or more (CAVOK)"));
        assert!(report.summary.contains("1021 hPa"));
    }

    #[test]
    fn test_decode_wind_mps_converted_to_knots() {
        let report = decode("METAR UUEE 121230Z 27010MPS 9999 SCT020 05/01 Q1005", ReportKind::Metar)
            .unwrap();
        assert_eq!(report.conditions.wind.unwrap().speed_kt, 19);
    }

    #[test]
    fn test_decode_calm_wind_summary() {
        let report =
            decode("METAR KSFO 121256Z 00000KT 10SM CLR 14/10 A3005", ReportKind::Metar).unwrap();
        assert!(report.summary.contains("Wind: calm"));
        assert!(report.summary.contains("Clouds: sky clear"));
    }

    #[test]
    fn test_summary_marks_missing_fields() {
        let report = decode("METAR KXYZ 121256Z", ReportKind::Metar).unwrap();
        assert!(report.summary.contains("Wind: not reported"));
        assert!(report.summary.contains("Visibility: not reported"));
        assert!(report.summary.contains("Weather: not reported"));
        assert!(report.summary.contains("Clouds: not reported"));
        assert!(report.summary.contains("Temperature: not reported"));
        assert!(report.summary.contains("Pressure: not reported"));
    }

    #[test]
    fn test_summary_clause_order() {
        let report = decode(KJFK_METAR, ReportKind::Metar).unwrap();
        let s = &report.summary;
        let order = [
            "METAR for KJFK",
            "Wind:",
            "Visibility:",
            "Weather:",
            "Clouds:",
            "Temperature:",
            "Pressure:",
        ];
        let positions: Vec<usize> = order.iter().map(|p| s.find(p).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_decode_rvr_and_recent_weather() {
        let report = decode(
            "METAR KJFK 121251Z 04012KT 1/4SM R04R/1800V3000FT FG VV002 08/08 A2990 RERA",
            ReportKind::Metar,
        )
        .unwrap();
        assert_eq!(report.conditions.runway_visual_range.len(), 1);
        assert_eq!(
            report.conditions.clouds[0].coverage,
            CloudCoverage::VerticalVisibility
        );
        // Vertical visibility is not a broken/overcast layer
        assert_eq!(report.conditions.ceiling, Ceiling::Unlimited);
    }

    #[test]
    fn test_decode_less_than_visibility() {
        let report =
            decode("METAR KSEA 121253Z 18005KT M1/4SM FG OVC001 09/09 A2999", ReportKind::Metar)
                .unwrap();
        let vis = report.conditions.visibility.unwrap();
        assert_eq!(vis.qualifier, Some(VisibilityQualifier::LessThan));
        assert_eq!(vis.value, 0.25);
    }

    #[test]
    fn test_decode_empty_fails() {
        assert_eq!(decode("   ", ReportKind::Metar), Err(DecodeError::Empty));
        assert_eq!(decode("=", ReportKind::Taf), Err(DecodeError::Empty));
    }

    #[test]
    fn test_decode_missing_station_fails() {
        let err = decode("METAR 121251Z 28014KT", ReportKind::Metar).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingStation {
                raw: "METAR 121251Z 28014KT".to_string()
            }
        );
    }

    #[test]
    fn test_decode_taf_as_metar_fails() {
        let err = decode(KJFK_TAF, ReportKind::Metar).unwrap_err();
        assert!(matches!(err, DecodeError::MissingStation { .. }));
    }

    #[test]
    fn test_decode_taf_without_validity_fails() {
        let err = decode("TAF KJFK 121130Z 28012KT P6SM", ReportKind::Taf).unwrap_err();
        assert!(matches!(err, DecodeError::MissingValidity { .. }));
    }

    #[test]
    fn test_decode_nil_report_fails() {
        let err = decode("METAR KJFK 121251Z NIL", ReportKind::Metar).unwrap_err();
        assert!(matches!(err, DecodeError::NilReport { .. }));
    }

    #[test]
    fn test_decode_malformed_group_fails() {
        let err = decode("METAR KJFK 121251Z 28014KT 10SM XYZZY", ReportKind::Metar).unwrap_err();
        match err {
            DecodeError::MalformedGroup { group, raw } => {
                assert_eq!(group, "XYZZY");
                assert!(raw.starts_with("METAR KJFK"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_decode_non_ascii_runway_group_fails() {
        let err = decode("METAR KJFK 121251Z 28014KT R1€/12", ReportKind::Metar).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedGroup { ref group, .. } if group == "R1€/12"));
        assert!(!is_runway_visual_range("Rü4/0600"));
    }

    #[test]
    fn test_decode_malformed_wind_fails() {
        let err = decode("METAR KJFK 121251Z 2801KT 10SM", ReportKind::Metar).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedGroup { ref group, .. } if group == "2801KT"));
    }

    #[test]
    fn test_decode_invalid_time_fails() {
        let err = decode("METAR KJFK 129951Z 28014KT", ReportKind::Metar).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedGroup { .. }));
    }

    #[test]
    fn test_parse_weather_rejects_non_weather() {
        assert!(parse_weather("FEW250").is_none());
        assert!(parse_weather("CB").is_none());
        assert!(parse_weather("XX").is_none());
        assert!(parse_weather("VCSH").is_some());
        assert!(parse_weather("-FZDZ").unwrap().is_freezing());
    }

    #[test]
    fn test_describe_weather_phrases() {
        assert_eq!(describe_weather(&parse_weather("-SHRA").unwrap()), "light rain showers");
        assert_eq!(describe_weather(&parse_weather("FZFG").unwrap()), "freezing fog");
        assert_eq!(describe_weather(&parse_weather("VCTS").unwrap()), "thunderstorm in the vicinity");
        assert_eq!(describe_weather(&parse_weather("RASN").unwrap()), "rain and snow");
    }
}
