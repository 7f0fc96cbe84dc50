use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::collection::GeoDataCollection;
use crate::domain::{Building, DomainEntity, FeatureInfo, Point, Polygon, Road, Tags};
use crate::geometry::Coordinate;
use crate::processing::height::estimate_building_height;
use crate::processing::raw::RawElement;
use crate::processing::tables::{
    DEFAULT_BUILDING_NAME, DEFAULT_BUILDING_TYPE, DEFAULT_HIGHWAY_TYPE, POINT_FALLBACK_TYPE,
    POINT_TYPE_KEYS, POLYGON_FALLBACK_TYPE, POLYGON_TYPE_KEYS, building_color, road_width,
};
use crate::services::elevation::ElevationLookup;
use crate::utils::capitalize;
use crate::utils::config::{Config, invalid};
use crate::utils::error::Result;

/// Building vertices sent to the elevation lookup for the terrain level.
pub const TERRAIN_SAMPLE_LIMIT: usize = 100;

/// Counters describing what happened to the elements of one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationStats {
    /// Elements looked at after the feature cap.
    pub processed: usize,
    /// Elements dropped by the feature cap.
    pub truncated: usize,
    pub untagged_nodes: usize,
    pub ways_without_geometry: usize,
    /// Open ways that are neither buildings nor roads.
    pub open_ways: usize,
    /// Buildings with fewer than three distinct vertices and roads with
    /// fewer than two coordinates.
    pub degenerate: usize,
    pub relations: usize,
    /// Records that are not usable elements at all.
    pub malformed: usize,
    pub buildings: usize,
    pub roads: usize,
    pub points: usize,
    pub polygons: usize,
}

impl ClassificationStats {
    pub fn features(&self) -> usize {
        self.buildings + self.roads + self.points + self.polygons
    }

    pub fn skipped(&self) -> usize {
        self.untagged_nodes
            + self.ways_without_geometry
            + self.open_ways
            + self.degenerate
            + self.relations
            + self.malformed
    }
}

/// Turns raw query responses into [`GeoDataCollection`]s.
///
/// Classification itself is deterministic; the only collaborator is the
/// elevation lookup used for the terrain level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureClassifier {
    max_features: usize,
    height_factor: f64,
}

impl Default for FeatureClassifier {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            max_features: defaults.max_features,
            height_factor: defaults.building_height_factor,
        }
    }
}

impl FeatureClassifier {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::default()
            .with_max_features(config.max_features)
            .with_height_factor(config.building_height_factor)
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Rejects factors that would produce non-finite or non-positive heights.
    pub fn with_height_factor(mut self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(invalid("DEFAULT_BUILDING_HEIGHT_FACTOR", factor));
        }
        self.height_factor = factor;
        Ok(self)
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    pub fn height_factor(&self) -> f64 {
        self.height_factor
    }

    /// Classifies a response; `None` when it carries no `elements` array.
    pub fn classify<E>(&self, raw: &Value, elevation: &mut E) -> Option<GeoDataCollection>
    where
        E: ElevationLookup + ?Sized,
    {
        self.classify_with_stats(raw, elevation)
            .map(|(collection, _)| collection)
    }

    pub fn classify_with_stats<E>(
        &self,
        raw: &Value,
        elevation: &mut E,
    ) -> Option<(GeoDataCollection, ClassificationStats)>
    where
        E: ElevationLookup + ?Sized,
    {
        let Some(elements) = raw.get("elements").and_then(Value::as_array) else {
            warn!("No elements found in query response");
            return None;
        };

        let mut stats = ClassificationStats::default();
        if elements.len() > self.max_features {
            stats.truncated = elements.len() - self.max_features;
            warn!(
                "Limiting processing to {} elements (from {})",
                self.max_features,
                elements.len()
            );
        }

        let mut buildings = Vec::new();
        let mut roads = Vec::new();
        let mut points = Vec::new();
        let mut polygons = Vec::new();
        for value in elements.iter().take(self.max_features) {
            stats.processed += 1;
            let Some(element) = RawElement::from_value(value) else {
                stats.malformed += 1;
                continue;
            };
            match self.classify_element(&element, &mut stats) {
                Some(DomainEntity::Building(building)) => buildings.push(building),
                Some(DomainEntity::Road(road)) => roads.push(road),
                Some(DomainEntity::Point(point)) => points.push(point),
                Some(DomainEntity::Polygon(polygon)) => polygons.push(polygon),
                None => {}
            }
        }
        stats.buildings = buildings.len();
        stats.roads = roads.len();
        stats.points = points.len();
        stats.polygons = polygons.len();

        let terrain_elevation = terrain_level(&buildings, elevation);
        info!(
            "Classified {} of {} elements ({} buildings, {} roads, {} points, {} polygons)",
            stats.features(),
            stats.processed,
            stats.buildings,
            stats.roads,
            stats.points,
            stats.polygons
        );
        let collection =
            GeoDataCollection::new(buildings, roads, points, polygons, terrain_elevation);
        Some((collection, stats))
    }

    /// Maps one element to at most one feature.
    pub fn classify_element(
        &self,
        element: &RawElement,
        stats: &mut ClassificationStats,
    ) -> Option<DomainEntity> {
        match element.type_field.as_str() {
            "node" => classify_node(element, stats).map(DomainEntity::Point),
            "way" => self.classify_way(element, stats),
            "relation" => {
                // multipolygon relations are not classified yet
                stats.relations += 1;
                None
            }
            other => {
                debug!("Skipping element of unknown type {:?}", other);
                stats.malformed += 1;
                None
            }
        }
    }

    fn classify_way(
        &self,
        element: &RawElement,
        stats: &mut ClassificationStats,
    ) -> Option<DomainEntity> {
        let coords = element.way_coordinates();
        if coords.is_empty() {
            stats.ways_without_geometry += 1;
            return None;
        }
        let tags = element.tags();

        if let Some(building_type) = tags.get("building") {
            let ring = close_ring(coords);
            if distinct_vertices(&ring) < 3 {
                stats.degenerate += 1;
                return None;
            }
            let building_type = if building_type.is_empty() {
                DEFAULT_BUILDING_TYPE.to_string()
            } else {
                building_type.clone()
            };
            let height = estimate_building_height(&tags, self.height_factor);
            let color = building_color(&building_type);
            let name = display_name(&tags, DEFAULT_BUILDING_NAME);
            return Some(DomainEntity::Building(Building {
                info: FeatureInfo::new(element.feature_id(), name, building_type, tags),
                coordinates: ring,
                height,
                color,
            }));
        }

        if let Some(highway) = tags.get("highway") {
            if coords.len() < 2 {
                stats.degenerate += 1;
                return None;
            }
            let highway = if highway.is_empty() {
                DEFAULT_HIGHWAY_TYPE.to_string()
            } else {
                highway.clone()
            };
            let width = road_width(&highway);
            let name = display_name(&tags, &capitalize(&highway));
            return Some(DomainEntity::Road(Road {
                info: FeatureInfo::new(element.feature_id(), name, highway, tags),
                coordinates: coords,
                width,
            }));
        }

        if !is_closed(&coords) {
            stats.open_ways += 1;
            return None;
        }
        let polygon_type = resolve_type(&tags, &POLYGON_TYPE_KEYS, POLYGON_FALLBACK_TYPE);
        let name = display_name(&tags, &capitalize(&polygon_type));
        Some(DomainEntity::Polygon(Polygon {
            info: FeatureInfo::new(element.feature_id(), name, polygon_type, tags),
            coordinates: coords,
        }))
    }
}

fn classify_node(element: &RawElement, stats: &mut ClassificationStats) -> Option<Point> {
    if !element.has_tags() {
        stats.untagged_nodes += 1;
        return None;
    }
    let Some(coordinate) = element.position() else {
        stats.malformed += 1;
        return None;
    };
    let tags = element.tags();
    let point_type = resolve_type(&tags, &POINT_TYPE_KEYS, POINT_FALLBACK_TYPE);
    let name = display_name(&tags, &capitalize(&point_type));
    Some(Point {
        info: FeatureInfo::new(element.feature_id(), name, point_type, tags),
        coordinate,
    })
}

/// Value of the first key in `keys` carrying a non-empty value.
pub fn resolve_type(tags: &Tags, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .filter_map(|key| tags.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn display_name(tags: &Tags, fallback: &str) -> String {
    match tags.get("name") {
        Some(name) => name.clone(),
        None => fallback.to_string(),
    }
}

fn is_closed(coords: &[Coordinate]) -> bool {
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) => first.same_bits(last),
        _ => false,
    }
}

/// Appends the first vertex when the ring is open.
fn close_ring(mut coords: Vec<Coordinate>) -> Vec<Coordinate> {
    if !is_closed(&coords) {
        if let Some(&first) = coords.first() {
            coords.push(first);
        }
    }
    coords
}

fn distinct_vertices(coords: &[Coordinate]) -> usize {
    coords
        .iter()
        .map(|c| (c.lon.to_bits(), c.lat.to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

/// Mean elevation of the first building vertices, 0 without buildings.
fn terrain_level<E>(buildings: &[Building], elevation: &mut E) -> f64
where
    E: ElevationLookup + ?Sized,
{
    if buildings.is_empty() {
        return 0.0;
    }
    let sample: Vec<Coordinate> = buildings
        .iter()
        .flat_map(|building| building.coordinates.iter().copied())
        .take(TERRAIN_SAMPLE_LIMIT)
        .collect();
    let elevations = elevation.get_elevations(&sample);
    if elevations.is_empty() {
        return 0.0;
    }
    elevations.iter().sum::<f64>() / elevations.len() as f64
}
