//! Built-in airport table.
//!
//! Used as the last resort for airport metadata, for free-text search, and
//! to find the nearest known station when every provider is unavailable.

use crate::models::{AirportRecord, Coordinate};
use crate::services::geo::distance_nm;

/// Default and maximum result counts for search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

struct StaticAirport {
    icao: &'static str,
    iata: &'static str,
    name: &'static str,
    city: &'static str,
    country: &'static str,
    latitude: f64,
    longitude: f64,
    elevation_ft: i32,
}

impl StaticAirport {
    fn to_record(&self) -> AirportRecord {
        AirportRecord {
            icao: self.icao.to_string(),
            iata: if self.iata.is_empty() {
                None
            } else {
                Some(self.iata.to_string())
            },
            name: self.name.to_string(),
            country: self.country.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            elevation_ft: Some(self.elevation_ft),
        }
    }

    fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

macro_rules! airport {
    ($icao:literal, $iata:literal, $name:literal, $city:literal, $country:literal, $lat:literal, $lon:literal, $elev:literal) => {
        StaticAirport {
            icao: $icao,
            iata: $iata,
            name: $name,
            city: $city,
            country: $country,
            latitude: $lat,
            longitude: $lon,
            elevation_ft: $elev,
        }
    };
}

static AIRPORTS: &[StaticAirport] = &[
    airport!("KJFK", "JFK", "John F. Kennedy International Airport", "New York", "US", 40.6398, -73.7789, 13),
    airport!("KLGA", "LGA", "LaGuardia Airport", "New York", "US", 40.7772, -73.8726, 21),
    airport!("KEWR", "EWR", "Newark Liberty International Airport", "Newark", "US", 40.6925, -74.1687, 18),
    airport!("KBOS", "BOS", "General Edward Lawrence Logan International Airport", "Boston", "US", 42.3643, -71.0052, 20),
    airport!("KORD", "ORD", "Chicago O'Hare International Airport", "Chicago", "US", 41.9786, -87.9048, 672),
    airport!("KATL", "ATL", "Hartsfield-Jackson Atlanta International Airport", "Atlanta", "US", 33.6367, -84.4281, 1026),
    airport!("KDFW", "DFW", "Dallas/Fort Worth International Airport", "Dallas", "US", 32.8968, -97.0380, 607),
    airport!("KDEN", "DEN", "Denver International Airport", "Denver", "US", 39.8617, -104.6732, 5434),
    airport!("KLAS", "LAS", "Harry Reid International Airport", "Las Vegas", "US", 36.0801, -115.1522, 2181),
    airport!("KLAX", "LAX", "Los Angeles International Airport", "Los Angeles", "US", 33.9425, -118.4081, 128),
    airport!("KSFO", "SFO", "San Francisco International Airport", "San Francisco", "US", 37.6190, -122.3749, 13),
    airport!("KSEA", "SEA", "Seattle-Tacoma International Airport", "Seattle", "US", 47.4490, -122.3093, 433),
    airport!("KMIA", "MIA", "Miami International Airport", "Miami", "US", 25.7932, -80.2906, 8),
    airport!("CYYZ", "YYZ", "Toronto Pearson International Airport", "Toronto", "CA", 43.6772, -79.6306, 569),
    airport!("CYVR", "YVR", "Vancouver International Airport", "Vancouver", "CA", 49.1939, -123.1844, 14),
    airport!("EGLL", "LHR", "London Heathrow Airport", "London", "GB", 51.4706, -0.4619, 83),
    airport!("EDDF", "FRA", "Frankfurt am Main Airport", "Frankfurt", "DE", 50.0333, 8.5706, 364),
    airport!("LFPG", "CDG", "Paris Charles de Gaulle Airport", "Paris", "FR", 49.0128, 2.5500, 392),
    airport!("EHAM", "AMS", "Amsterdam Airport Schiphol", "Amsterdam", "NL", 52.3086, 4.7639, -11),
    airport!("LSZH", "ZRH", "Zurich Airport", "Zurich", "CH", 47.4647, 8.5492, 1416),
    airport!("LEMD", "MAD", "Adolfo Suarez Madrid-Barajas Airport", "Madrid", "ES", 40.4719, -3.5626, 1998),
    airport!("RJTT", "HND", "Tokyo Haneda Airport", "Tokyo", "JP", 35.5523, 139.7800, 35),
    airport!("YSSY", "SYD", "Sydney Kingsford Smith Airport", "Sydney", "AU", -33.9461, 151.1772, 21),
    airport!("OMDB", "DXB", "Dubai International Airport", "Dubai", "AE", 25.2528, 55.3644, 62),
];

pub fn lookup(icao: &str) -> Option<AirportRecord> {
    AIRPORTS
        .iter()
        .find(|a| a.icao.eq_ignore_ascii_case(icao))
        .map(StaticAirport::to_record)
}

/// Ordered match: exact ICAO/IATA code, then name or city prefix, then
/// substring anywhere in name or city.
pub fn search(query: &str, limit: usize) -> Vec<AirportRecord> {
    let q = query.trim().to_ascii_lowercase();
    if q.is_empty() {
        return Vec::new();
    }

    let rank = |a: &StaticAirport| -> Option<u8> {
        let name = a.name.to_ascii_lowercase();
        let city = a.city.to_ascii_lowercase();
        if a.icao.eq_ignore_ascii_case(&q) || a.iata.eq_ignore_ascii_case(&q) {
            Some(0)
        } else if name.starts_with(&q) || city.starts_with(&q) {
            Some(1)
        } else if name.contains(&q) || city.contains(&q) {
            Some(2)
        } else {
            None
        }
    };

    let mut matches: Vec<(u8, &StaticAirport)> = AIRPORTS
        .iter()
        .filter_map(|a| rank(a).map(|r| (r, a)))
        .collect();
    matches.sort_by_key(|(r, a)| (*r, a.icao));
    matches
        .into_iter()
        .take(limit)
        .map(|(_, a)| a.to_record())
        .collect()
}

/// Nearest table airport to `point`, with its distance in nautical miles.
pub fn nearest(point: Coordinate) -> Option<(AirportRecord, f64)> {
    AIRPORTS
        .iter()
        .map(|a| (a, distance_nm(point, a.coordinate())))
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(a, d)| (a.to_record(), d))
}
