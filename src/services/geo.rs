//! Great-circle geometry: distances and evenly spaced enroute samples.

use crate::helpers::km_to_nm;
use crate::models::Coordinate;

/// Interior points sampled along a route when the caller does not say.
pub const DEFAULT_ENROUTE_SAMPLES: usize = 8;
/// Smallest interior sample count accepted from callers.
pub const MIN_ENROUTE_SAMPLES: usize = 2;
/// Largest interior sample count accepted from callers.
pub const MAX_ENROUTE_SAMPLES: usize = 50;

/// Below this angular distance (radians) two points are the same point.
const COINCIDENT_EPSILON: f64 = 1e-12;

/// Clamp a caller-supplied sample count to the accepted range.
pub fn clamp_samples(n: usize) -> usize {
    n.clamp(MIN_ENROUTE_SAMPLES, MAX_ENROUTE_SAMPLES)
}

/// Great-circle distance in nautical miles.
pub fn distance_nm(a: Coordinate, b: Coordinate) -> f64 {
    let km = haversine::distance(
        haversine::Location {
            latitude: a.latitude,
            longitude: a.longitude,
        },
        haversine::Location {
            latitude: b.latitude,
            longitude: b.longitude,
        },
        haversine::Units::Kilometers,
    );
    km_to_nm(km)
}

/// Central angle between two points (radians), by the haversine formula.
fn angular_distance(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

fn to_unit_vector(c: Coordinate) -> [f64; 3] {
    let (lat, lon) = (c.latitude.to_radians(), c.longitude.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_unit_vector(v: [f64; 3]) -> Coordinate {
    let [x, y, z] = v;
    Coordinate {
        latitude: z.atan2((x * x + y * y).sqrt()).to_degrees(),
        longitude: y.atan2(x).to_degrees(),
    }
}

/// `n` interior points evenly spaced along the great circle from `start` to
/// `end`, excluding both endpoints. Point `i` (1-based) sits at fraction
/// `i / (n + 1)` of the arc.
///
/// Returns `[start]` when the two points coincide. Callers clamp `n` with
/// [`clamp_samples`] first.
pub fn sample_great_circle(start: Coordinate, end: Coordinate, n: usize) -> Vec<Coordinate> {
    let d = angular_distance(start, end);
    if d < COINCIDENT_EPSILON {
        return vec![start];
    }

    let sin_d = d.sin();
    let a = to_unit_vector(start);
    let b = to_unit_vector(end);

    (1..=n)
        .map(|i| {
            let f = i as f64 / (n + 1) as f64;
            if sin_d.abs() < COINCIDENT_EPSILON {
                // Antipodal: no unique great circle, interpolate coordinates
                return Coordinate {
                    latitude: start.latitude + f * (end.latitude - start.latitude),
                    longitude: start.longitude + f * (end.longitude - start.longitude),
                };
            }
            let ka = ((1.0 - f) * d).sin() / sin_d;
            let kb = (f * d).sin() / sin_d;
            from_unit_vector([
                ka * a[0] + kb * b[0],
                ka * a[1] + kb * b[1],
                ka * a[2] + kb * b[2],
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KJFK: Coordinate = Coordinate {
        latitude: 40.6398,
        longitude: -73.7789,
    };
    const KLAX: Coordinate = Coordinate {
        latitude: 33.9425,
        longitude: -118.4081,
    };

    #[test]
    fn test_identical_points_return_start() {
        assert_eq!(sample_great_circle(KJFK, KJFK, 8), vec![KJFK]);
    }

    #[test]
    fn test_sample_count_and_interior() {
        let points = sample_great_circle(KJFK, KLAX, 8);
        assert_eq!(points.len(), 8);
        for p in &points {
            assert!(distance_nm(*p, KJFK) > 1.0);
            assert!(distance_nm(*p, KLAX) > 1.0);
        }
    }

    #[test]
    fn test_samples_progress_monotonically() {
        let points = sample_great_circle(KJFK, KLAX, 20);
        let distances: Vec<f64> = points.iter().map(|p| distance_nm(KJFK, *p)).collect();
        assert!(distances.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_samples_evenly_spaced() {
        let total = distance_nm(KJFK, KLAX);
        let points = sample_great_circle(KJFK, KLAX, 3);
        // Quarter points of the arc
        for (i, p) in points.iter().enumerate() {
            let expected = total * (i + 1) as f64 / 4.0;
            assert!((distance_nm(KJFK, *p) - expected).abs() < 1.0);
        }
    }

    #[test]
    fn test_midpoint_on_equator() {
        let a = Coordinate {
            latitude: 0.0,
            longitude: 0.0,
        };
        let b = Coordinate {
            latitude: 0.0,
            longitude: 90.0,
        };
        let points = sample_great_circle(a, b, 1);
        assert_eq!(points.len(), 1);
        assert!(points[0].latitude.abs() < 1e-9);
        assert!((points[0].longitude - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_jfk_lax() {
        // Roughly 2145 nm
        let d = distance_nm(KJFK, KLAX);
        assert!((2100.0..2200.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_clamp_samples() {
        assert_eq!(clamp_samples(0), 2);
        assert_eq!(clamp_samples(8), 8);
        assert_eq!(clamp_samples(500), 50);
    }
}
