//! Distance and area approximations on a spherical earth.

use geo::{Area, Coord, LineString, Polygon};

use crate::geometry::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Metres per degree of latitude in the local flat-earth approximation.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Great-circle distance between two coordinates in metres.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin() * EARTH_RADIUS_M
}

/// Sum of haversine segment lengths of a polyline in metres.
pub fn haversine_length(coords: &[Coordinate]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}

/// Flat-earth distance between two nearby coordinates in metres, scaling the
/// longitude delta by the cosine of `to`'s latitude.
pub fn planar_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let dx = (to.lon - from.lon) * METERS_PER_DEGREE * to.lat.to_radians().cos();
    let dy = (to.lat - from.lat) * METERS_PER_DEGREE;
    (dx * dx + dy * dy).sqrt()
}

/// Footprint area of a ring in square metres.
///
/// Projects onto a local tangent plane anchored at the first vertex and applies
/// the shoelace formula. Only meaningful for small footprints.
pub fn planar_area(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let origin = ring[0];
    let lon_factor = METERS_PER_DEGREE * origin.lat.to_radians().cos();
    let projected: LineString<f64> = ring
        .iter()
        .map(|c| Coord {
            x: (c.lon - origin.lon) * lon_factor,
            y: (c.lat - origin.lat) * METERS_PER_DEGREE,
        })
        .collect();
    // Polygon::new closes the ring if needed
    Polygon::new(projected, vec![]).unsigned_area()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    #[test]
    fn test_haversine_one_degree_on_equator() {
        let d = haversine_distance(&c(0.0, 0.0), &c(1.0, 0.0));
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_haversine_length_sums_segments() {
        let coords = vec![c(0.0, 0.0), c(1.0, 0.0), c(2.0, 0.0)];
        let one = haversine_distance(&coords[0], &coords[1]);
        assert!((haversine_length(&coords) - 2.0 * one).abs() < 1e-6);
        assert_eq!(haversine_length(&coords[..1]), 0.0);
        assert_eq!(haversine_length(&[]), 0.0);
    }

    #[test]
    fn test_planar_distance_north() {
        let d = planar_distance(&c(0.0, 0.0), &c(0.0, 0.001));
        assert!((d - 111.0).abs() < 1e-6);
    }

    #[test]
    fn test_planar_area_square_at_equator() {
        // 0.001 deg square ~ 111m x 111m
        let ring = vec![
            c(0.0, 0.0),
            c(0.001, 0.0),
            c(0.001, 0.001),
            c(0.0, 0.001),
            c(0.0, 0.0),
        ];
        let area = planar_area(&ring);
        assert!((area - 111.0 * 111.0).abs() < 1e-6, "got {}", area);
    }

    #[test]
    fn test_planar_area_shrinks_with_latitude() {
        let square = |lat: f64| {
            vec![
                c(0.0, lat),
                c(0.001, lat),
                c(0.001, lat + 0.001),
                c(0.0, lat + 0.001),
                c(0.0, lat),
            ]
        };
        let equator = planar_area(&square(0.0));
        let sixty = planar_area(&square(60.0));
        assert!((sixty / equator - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_planar_area_degenerate() {
        assert_eq!(planar_area(&[c(0.0, 0.0), c(1.0, 1.0)]), 0.0);
    }
}
