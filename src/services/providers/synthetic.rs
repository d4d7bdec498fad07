//! Synthetic weather, the last link of the provider chain.
//!
//! Major airports get a fixed, plausible sample stamped with the current
//! time. Any other airport gets a randomly generated report drawn from
//! bounded ranges, formatted the way a real station would report it, so the
//! decoder always accepts the result.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::RngExt;

use crate::models::{Notam, RawReport, ReportKind};
use crate::services::severity::classify_notam;

/// `RawReport::source` for everything produced here.
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Hours after the TAF start at which the sample FM group begins.
const TAF_CHANGE_OFFSET_HOURS: i64 = 6;
const TAF_VALIDITY_HOURS: i64 = 24;

struct SampleWeather {
    icao: &'static str,
    /// METAR body after the observation time
    metar: &'static str,
    /// TAF initial conditions
    taf_initial: &'static str,
    /// TAF conditions from the FM group onwards
    taf_change: &'static str,
}

static SAMPLES: &[SampleWeather] = &[
    SampleWeather {
        icao: "KJFK",
        metar: "28014G20KT 10SM FEW250 24/18 A3000",
        taf_initial: "28012KT P6SM FEW250",
        taf_change: "30015G22KT P6SM SCT050",
    },
    SampleWeather {
        icao: "KLAX",
        metar: "25008KT 10SM FEW015 SCT200 19/14 A2992",
        taf_initial: "25008KT P6SM FEW015",
        taf_change: "27012KT P6SM SKC",
    },
    SampleWeather {
        icao: "KORD",
        metar: "27015G24KT 10SM SCT045 BKN250 17/08 A2987",
        taf_initial: "27014G22KT P6SM SCT045",
        taf_change: "29010KT P6SM FEW060",
    },
    SampleWeather {
        icao: "KSFO",
        metar: "29012KT 10SM FEW008 16/12 A2998",
        taf_initial: "28012KT P6SM FEW008",
        taf_change: "29016G24KT P6SM SKC",
    },
    SampleWeather {
        icao: "KDEN",
        metar: "19010KT 10SM SCT120 21/03 A3017",
        taf_initial: "18010KT P6SM SCT120",
        taf_change: "20014G20KT P6SM BKN120",
    },
    SampleWeather {
        icao: "KATL",
        metar: "09006KT 10SM FEW040 BKN250 27/19 A3004",
        taf_initial: "09006KT P6SM FEW040",
        taf_change: "12008KT P6SM SCT040",
    },
    SampleWeather {
        icao: "KSEA",
        metar: "18007KT 10SM BKN035 OVC060 13/09 A3008",
        taf_initial: "18008KT P6SM BKN035",
        taf_change: "20010KT 5SM -RA OVC030",
    },
    SampleWeather {
        icao: "KBOS",
        metar: "05011KT 10SM FEW030 SCT250 18/11 A3011",
        taf_initial: "05010KT P6SM FEW030",
        taf_change: "07012KT P6SM SCT025",
    },
    SampleWeather {
        icao: "EGLL",
        metar: "24010KT 9999 SCT035 16/09 Q1015",
        taf_initial: "24010KT 9999 SCT035",
        taf_change: "26012KT 9999 BKN025",
    },
    SampleWeather {
        icao: "EDDF",
        metar: "22008KT 9999 FEW040 18/07 Q1018",
        taf_initial: "22008KT 9999 FEW040",
        taf_change: "24010KT CAVOK",
    },
    SampleWeather {
        icao: "LFPG",
        metar: "23012KT 9999 SCT030 17/10 Q1016",
        taf_initial: "23012KT 9999 SCT030",
        taf_change: "25015G25KT 9999 BKN030",
    },
    SampleWeather {
        icao: "EHAM",
        metar: "24016KT 9999 BKN022 15/11 Q1012",
        taf_initial: "24016KT 9999 BKN022",
        taf_change: "26018G28KT 8000 -SHRA BKN018",
    },
    SampleWeather {
        icao: "LSZH",
        metar: "VRB03KT CAVOK 19/08 Q1021",
        taf_initial: "VRB03KT CAVOK",
        taf_change: "06006KT 9999 FEW050",
    },
    SampleWeather {
        icao: "RJTT",
        metar: "16012KT 9999 FEW030 25/19 Q1011",
        taf_initial: "16012KT 9999 FEW030",
        taf_change: "18014KT 9999 SCT030",
    },
    SampleWeather {
        icao: "YSSY",
        metar: "33010KT CAVOK 21/11 Q1019",
        taf_initial: "33010KT CAVOK",
        taf_change: "18015KT 9999 SCT035",
    },
    SampleWeather {
        icao: "CYYZ",
        metar: "26010KT 15SM FEW040 16/05 A3005",
        taf_initial: "26010KT P6SM FEW040",
        taf_change: "28012KT P6SM SCT050",
    },
];

/// Built-in NOTAM samples as (airport, number, text).
static SAMPLE_NOTAMS: &[(&str, &str, &str)] = &[
    ("KJFK", "A0101/26", "TWY B CLSD BTN TWY K AND TWY KA"),
    ("KJFK", "A0102/26", "ILS RWY 04R LOC U/S"),
    ("KORD", "A0201/26", "BIRD ACTIVITY IN VICINITY OF AERODROME"),
    ("EGLL", "A0301/26", "OBST CRANE 250FT AGL 1NM E OF AD LGT U/S"),
];

/// Provider of last resort. Never fails.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, kind: ReportKind, icao: &str) -> RawReport {
        self.report_at(kind, icao, Utc::now())
    }

    pub fn report_at(&self, kind: ReportKind, icao: &str, now: DateTime<Utc>) -> RawReport {
        let icao = icao.to_ascii_uppercase();
        let sample = SAMPLES.iter().find(|s| s.icao == icao);
        let raw_text = match (kind, sample) {
            (ReportKind::Metar, Some(s)) => {
                format!("METAR {} {} {}", icao, observation_time(now), s.metar)
            }
            (ReportKind::Taf, Some(s)) => taf_text(&icao, now, s.taf_initial, s.taf_change),
            (ReportKind::Metar, None) => random_metar(&mut rand::rng(), &icao, now),
            (ReportKind::Taf, None) => random_taf(&mut rand::rng(), &icao, now),
        };

        if sample.is_none() {
            tracing::debug!("Generated random {} for {}", kind, icao);
        }

        RawReport {
            airport: icao,
            kind,
            raw_text,
            fetched_at: now,
            source: SYNTHETIC_SOURCE.to_string(),
        }
    }

    /// Built-in NOTAMs for `icao`, or an empty list. NOTAMs are never invented.
    pub fn notams(&self, icao: &str) -> Vec<Notam> {
        SAMPLE_NOTAMS
            .iter()
            .filter(|(airport, _, _)| airport.eq_ignore_ascii_case(icao))
            .map(|(airport, number, text)| Notam {
                id: number.to_string(),
                airport: airport.to_string(),
                text: text.to_string(),
                effective_from: None,
                effective_to: None,
                severity: classify_notam(text),
            })
            .collect()
    }
}

/// "ddhhmmZ"
fn observation_time(now: DateTime<Utc>) -> String {
    now.format("%d%H%MZ").to_string()
}

fn taf_text(icao: &str, now: DateTime<Utc>, initial: &str, change: &str) -> String {
    let start = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(now);
    let end = start + Duration::hours(TAF_VALIDITY_HOURS);
    let change_at = start + Duration::hours(TAF_CHANGE_OFFSET_HOURS);
    format!(
        "TAF {} {} {}/{} {} FM{} {}",
        icao,
        observation_time(now),
        start.format("%d%H"),
        end.format("%d%H"),
        initial,
        change_at.format("%d%H00"),
        change
    )
}

/// North American stations report statute miles and inches of mercury.
fn uses_us_units(icao: &str) -> bool {
    icao.starts_with(['K', 'C', 'P'])
}

fn format_temperature(t: i32) -> String {
    if t < 0 {
        format!("M{:02}", -t)
    } else {
        format!("{:02}", t)
    }
}

fn random_wind<R: RngExt + ?Sized>(rng: &mut R) -> String {
    let speed: u16 = rng.random_range(0..=25);
    if speed == 0 {
        return "00000KT".to_string();
    }
    let direction: u16 = rng.random_range(1..=36) * 10;
    if speed >= 10 && rng.random_bool(0.25) {
        let gust = speed + rng.random_range(5..=12);
        format!("{:03}{:02}G{:02}KT", direction, speed, gust)
    } else {
        format!("{:03}{:02}KT", direction, speed)
    }
}

fn random_visibility<R: RngExt + ?Sized>(rng: &mut R, us_units: bool) -> String {
    if us_units {
        const STATUTE_MILES: [u8; 6] = [10, 10, 10, 7, 5, 3];
        format!("{}SM", STATUTE_MILES[rng.random_range(0..STATUTE_MILES.len())])
    } else if rng.random_bool(0.7) {
        "9999".to_string()
    } else {
        format!("{:04}", rng.random_range(30..=99u32) * 100)
    }
}

fn random_clouds<R: RngExt + ?Sized>(rng: &mut R, us_units: bool) -> String {
    const COVERAGE: [&str; 3] = ["FEW", "SCT", "BKN"];
    if rng.random_bool(0.2) {
        return if us_units { "CLR" } else { "NSC" }.to_string();
    }
    let coverage = COVERAGE[rng.random_range(0..COVERAGE.len())];
    let base: u32 = rng.random_range(15..=250);
    format!("{}{:03}", coverage, base)
}

fn random_metar<R: RngExt + ?Sized>(rng: &mut R, icao: &str, now: DateTime<Utc>) -> String {
    let us_units = uses_us_units(icao);
    let temperature: i32 = rng.random_range(-10..=30);
    let dew_point = temperature - rng.random_range(0..=8);
    let pressure = if us_units {
        format!("A{}", rng.random_range(2960..=3040))
    } else {
        format!("Q{}", rng.random_range(1000..=1030))
    };
    format!(
        "METAR {} {} {} {} {} {}/{} {}",
        icao,
        observation_time(now),
        random_wind(rng),
        random_visibility(rng, us_units),
        random_clouds(rng, us_units),
        format_temperature(temperature),
        format_temperature(dew_point),
        pressure
    )
}

fn random_taf<R: RngExt + ?Sized>(rng: &mut R, icao: &str, now: DateTime<Utc>) -> String {
    let us_units = uses_us_units(icao);
    let initial = format!(
        "{} {} {}",
        random_wind(rng),
        random_visibility(rng, us_units),
        random_clouds(rng, us_units)
    );
    let change = format!(
        "{} {} {}",
        random_wind(rng),
        random_visibility(rng, us_units),
        random_clouds(rng, us_units)
    );
    taf_text(icao, now, &initial, &change)
}
