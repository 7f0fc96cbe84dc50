use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::geometry::measure::{haversine_length, planar_area};
use crate::geometry::{BoundingBox, Coordinate};

/// Raw source tags, ordered by key.
pub type Tags = BTreeMap<String, String>;

/// Provider-assigned element identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(id) => write!(f, "{}", id),
            FeatureId::Text(id) => f.write_str(id),
        }
    }
}

/// Identity and tags shared by every feature kind. Tags cannot change once
/// attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureInfo {
    id: Option<FeatureId>,
    name: String,
    #[serde(rename = "type")]
    feature_type: String,
    tags: Tags,
}

impl FeatureInfo {
    pub fn new(
        id: Option<FeatureId>,
        name: impl Into<String>,
        feature_type: impl Into<String>,
        tags: Tags,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            feature_type: feature_type.into(),
            tags,
        }
    }
}

/// Common capability of all classified features.
pub trait GeoFeature {
    fn info(&self) -> &FeatureInfo;

    fn coordinates(&self) -> &[Coordinate];

    fn id(&self) -> Option<&FeatureId> {
        self.info().id.as_ref()
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn feature_type(&self) -> &str {
        &self.info().feature_type
    }

    fn tags(&self) -> &Tags {
        &self.info().tags
    }

    fn get_tag<'a>(&'a self, key: &str, default: Option<&'a str>) -> Option<&'a str> {
        self.tags().get(key).map(String::as_str).or(default)
    }

    /// Key present and, when `value` is given, equal to it.
    fn has_tag(&self, key: &str, value: Option<&str>) -> bool {
        match (self.tags().get(key), value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
        }
    }

    /// Every key/value pair of `filter` matches exactly.
    fn matches_tags(&self, filter: &Tags) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.has_tag(key, Some(value)))
    }

    /// At least one coordinate lies inside `bbox`.
    fn intersects_bounds(&self, bbox: &BoundingBox) -> bool {
        self.coordinates().iter().any(|coord| bbox.contains(coord))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    #[serde(flatten)]
    pub info: FeatureInfo,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Road {
    #[serde(flatten)]
    pub info: FeatureInfo,
    pub coordinates: Vec<Coordinate>,
    /// Metres.
    pub width: f64,
}

impl Road {
    /// Haversine length in metres.
    pub fn length(&self) -> f64 {
        haversine_length(&self.coordinates)
    }

    pub fn highway(&self) -> &str {
        self.feature_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    #[serde(flatten)]
    pub info: FeatureInfo,
    /// Closed ring, first and last coordinate identical.
    pub coordinates: Vec<Coordinate>,
    /// Metres.
    pub height: f64,
    /// RGBA fill.
    pub color: [u8; 4],
}

impl Building {
    /// Approximate footprint in square metres.
    pub fn footprint_area(&self) -> f64 {
        planar_area(&self.coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    #[serde(flatten)]
    pub info: FeatureInfo,
    /// Closed ring, first and last coordinate identical.
    pub coordinates: Vec<Coordinate>,
}

impl GeoFeature for Point {
    fn info(&self) -> &FeatureInfo {
        &self.info
    }

    fn coordinates(&self) -> &[Coordinate] {
        std::slice::from_ref(&self.coordinate)
    }

    fn intersects_bounds(&self, bbox: &BoundingBox) -> bool {
        bbox.contains(&self.coordinate)
    }
}

impl GeoFeature for Road {
    fn info(&self) -> &FeatureInfo {
        &self.info
    }

    fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }
}

impl GeoFeature for Building {
    fn info(&self) -> &FeatureInfo {
        &self.info
    }

    fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }
}

impl GeoFeature for Polygon {
    fn info(&self) -> &FeatureInfo {
        &self.info
    }

    fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }
}

// --- Domain Entity Enum ---
/// Result of classifying a single raw element.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEntity {
    Point(Point),
    Road(Road),
    Building(Building),
    Polygon(Polygon),
}

impl DomainEntity {
    pub fn is_point(&self) -> bool {
        matches!(self, DomainEntity::Point(_))
    }
    pub fn is_road(&self) -> bool {
        matches!(self, DomainEntity::Road(_))
    }
    pub fn is_building(&self) -> bool {
        matches!(self, DomainEntity::Building(_))
    }
    pub fn is_polygon(&self) -> bool {
        matches!(self, DomainEntity::Polygon(_))
    }
}
