//! Shared helpers for airport codes and unit conversions.
//!
//! Conversion factors used across the decoder, classifier and geo sampler:
//!
//! - statute miles → meters: ×1609.34 (the factor every visibility threshold uses)
//! - m/s → knots: ×1.94384
//! - km/h → knots: ×0.539957
//! - kilometers → nautical miles: ÷1.852
//! - meters → feet: ×3.28084

/// Meters per statute mile, as applied to visibility thresholds.
pub(crate) const METERS_PER_STATUTE_MILE: f64 = 1609.34;

/// Kilometers per nautical mile.
pub(crate) const KM_PER_NAUTICAL_MILE: f64 = 1.852;

/// Trim and upper-case an airport code. Does not validate.
pub(crate) fn normalize_icao(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// An ICAO code is exactly 4 ASCII alphanumeric characters.
pub(crate) fn is_valid_icao(code: &str) -> bool {
    code.len() == 4 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

pub(crate) fn statute_miles_to_meters(sm: f64) -> f64 {
    sm * METERS_PER_STATUTE_MILE
}

pub(crate) fn mps_to_knots(mps: f64) -> f64 {
    mps * 1.94384
}

pub(crate) fn kmh_to_knots(kmh: f64) -> f64 {
    kmh * 0.539957
}

pub(crate) fn km_to_nm(km: f64) -> f64 {
    km / KM_PER_NAUTICAL_MILE
}

pub(crate) fn meters_to_feet(m: f64) -> f64 {
    m * 3.28084
}

/// Round to `dp` decimal places, returning 0.0 for non-finite input.
pub(crate) fn round_to(v: f64, dp: i32) -> f64 {
    if !v.is_finite() {
        tracing::warn!("round_to received non-finite value {}, defaulting to 0", v);
        return 0.0;
    }
    let factor = 10f64.powi(dp);
    (v * factor).round() / factor
}
