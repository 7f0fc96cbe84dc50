use geo::{Coord, Rect};
use serde::Serialize;

use crate::geometry::Coordinate;
use crate::utils::error::{Error, Result};

/// Axis-aligned box in degrees, `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(Error::InvalidBoundingBox {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Smallest box holding every coordinate, `None` for an empty input.
    pub fn from_coordinates<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for coord in iter {
            bbox.min_lon = bbox.min_lon.min(coord.lon);
            bbox.min_lat = bbox.min_lat.min(coord.lat);
            bbox.max_lon = bbox.max_lon.max(coord.lon);
            bbox.max_lat = bbox.max_lat.max(coord.lat);
        }
        Some(bbox)
    }

    /// Box of `half_size` degrees around a center.
    pub fn around(center: Coordinate, half_size: f64) -> Self {
        let half_size = half_size.abs();
        Self {
            min_lon: center.lon - half_size,
            min_lat: center.lat - half_size,
            max_lon: center.lon + half_size,
            max_lat: center.lat + half_size,
        }
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Inclusive on every edge.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.min_lon <= coord.lon
            && coord.lon <= self.max_lon
            && self.min_lat <= coord.lat
            && coord.lat <= self.max_lat
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        // Rect normalizes its corners, so min <= max holds.
        let min = rect.min();
        let max = rect.max();
        Self {
            min_lon: min.x,
            min_lat: min.y,
            max_lon: max.x,
            max_lat: max.y,
        }
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        Rect::new(
            Coord {
                x: bbox.min_lon,
                y: bbox.min_lat,
            },
            Coord {
                x: bbox.max_lon,
                y: bbox.max_lat,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 1.0, 1.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_center_and_contains() {
        let bbox = BoundingBox::new(10.0, 50.0, 12.0, 52.0).unwrap();
        assert_eq!(bbox.center(), Coordinate::new(11.0, 51.0));
        assert!(bbox.contains(&Coordinate::new(11.0, 51.0)));
        // edges are inclusive
        assert!(bbox.contains(&Coordinate::new(10.0, 50.0)));
        assert!(bbox.contains(&Coordinate::new(12.0, 52.0)));
        assert!(!bbox.contains(&Coordinate::new(12.000001, 51.0)));
    }

    #[test]
    fn test_from_coordinates() {
        let coords = vec![
            Coordinate::new(1.0, 5.0),
            Coordinate::new(-2.0, 3.0),
            Coordinate::new(4.0, -1.0),
        ];
        let bbox = BoundingBox::from_coordinates(&coords).unwrap();
        assert_eq!(bbox.as_array(), [-2.0, -1.0, 4.0, 5.0]);
        assert_eq!(BoundingBox::from_coordinates(&Vec::<Coordinate>::new()), None);
    }

    #[test]
    fn test_rect_round_trip() {
        let rect = Rect::new(Coord { x: 3.0, y: 4.0 }, Coord { x: 1.0, y: 2.0 });
        let bbox = BoundingBox::from(rect);
        assert_eq!(bbox.as_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Rect::from(bbox), rect);
    }
}
