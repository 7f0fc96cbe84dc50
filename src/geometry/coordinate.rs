use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

/// A geographic position in degrees. Serializes to the map form
/// `{"lon": .., "lat": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `(lon, lat)` pair.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }

    /// `[lon, lat]`, the GeoJSON position order.
    pub fn as_array(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Bit-level equality, used for ring closure checks.
    pub fn same_bits(&self, other: &Coordinate) -> bool {
        self.lon.to_bits() == other.lon.to_bits() && self.lat.to_bits() == other.lat.to_bits()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Coordinate { lon, lat }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(coord: Coordinate) -> Self {
        coord.as_tuple()
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(coord: Coord<f64>) -> Self {
        Coordinate {
            lon: coord.x,
            lat: coord.y,
        }
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(coord: Coordinate) -> Self {
        Coord {
            x: coord.lon,
            y: coord.lat,
        }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(coord: Coordinate) -> Self {
        Point::new(coord.lon, coord.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversions() {
        let coord = Coordinate::new(13.4, 52.5);
        assert_eq!(coord.as_tuple(), (13.4, 52.5));
        assert_eq!(coord.as_array(), [13.4, 52.5]);
        let geo_coord: Coord<f64> = coord.into();
        assert_eq!(geo_coord, Coord { x: 13.4, y: 52.5 });
        assert_eq!(Coordinate::from(geo_coord), coord);
        assert_eq!(Coordinate::from((1.0, 2.0)), Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn test_map_form() {
        let coord = Coordinate::new(13.4, 52.5);
        assert_eq!(
            serde_json::to_value(coord).unwrap(),
            json!({"lon": 13.4, "lat": 52.5})
        );
    }

    #[test]
    fn test_same_bits_distinguishes_signed_zero() {
        let a = Coordinate::new(0.0, 1.0);
        let b = Coordinate::new(-0.0, 1.0);
        assert_eq!(a, b);
        assert!(!a.same_bits(&b));
        assert!(a.same_bits(&a));
    }
}
