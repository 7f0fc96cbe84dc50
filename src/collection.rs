use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

use crate::domain::{Building, FeatureId, GeoFeature, Point, Polygon, Road, Tags};
use crate::geometry::{BoundingBox, Coordinate};

/// Half size in degrees of the bounds reported for an empty collection.
const EMPTY_BOUNDS_HALF_SIZE: f64 = 0.01;

/// Classified features of one query result plus the sampled terrain level.
///
/// Filters never mutate the collection, they return a new one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeoDataCollection {
    buildings: Vec<Building>,
    roads: Vec<Road>,
    points: Vec<Point>,
    polygons: Vec<Polygon>,
    terrain_elevation: f64,
}

impl GeoDataCollection {
    pub fn new(
        buildings: Vec<Building>,
        roads: Vec<Road>,
        points: Vec<Point>,
        polygons: Vec<Polygon>,
        terrain_elevation: f64,
    ) -> Self {
        Self {
            buildings,
            roads,
            points,
            polygons,
            terrain_elevation: sanitize_elevation(terrain_elevation),
        }
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Mean sampled ground level in metres, 0 when unknown.
    pub fn terrain_elevation(&self) -> f64 {
        self.terrain_elevation
    }

    pub fn len(&self) -> usize {
        self.buildings.len() + self.roads.len() + self.points.len() + self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every coordinate of every feature, buildings first.
    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.buildings
            .iter()
            .flat_map(|b| b.coordinates.iter())
            .chain(self.roads.iter().flat_map(|r| r.coordinates.iter()))
            .chain(self.points.iter().map(|p| &p.coordinate))
            .chain(self.polygons.iter().flat_map(|p| p.coordinates.iter()))
    }

    /// Coordinate-wise extent of all features; a small box around the origin
    /// when the collection is empty.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_coordinates(self.coordinates()).unwrap_or_else(|| {
            BoundingBox::around(Coordinate::new(0.0, 0.0), EMPTY_BOUNDS_HALF_SIZE)
        })
    }

    pub fn center(&self) -> Coordinate {
        self.bounds().center()
    }

    /// Keeps features carrying every key/value pair of `filter`.
    pub fn filter_by_tags(&self, filter: &Tags) -> GeoDataCollection {
        self.retain(|feature| feature.matches_tags(filter))
    }

    /// Keeps features with at least one coordinate inside `bounds`.
    pub fn filter_by_bounds(&self, bounds: &BoundingBox) -> GeoDataCollection {
        self.retain(|feature| feature.intersects_bounds(bounds))
    }

    fn retain<F>(&self, keep: F) -> GeoDataCollection
    where
        F: Fn(&dyn GeoFeature) -> bool,
    {
        GeoDataCollection {
            buildings: keep_matching(&self.buildings, &keep),
            roads: keep_matching(&self.roads, &keep),
            points: keep_matching(&self.points, &keep),
            polygons: keep_matching(&self.polygons, &keep),
            terrain_elevation: self.terrain_elevation,
        }
    }

    /// Render-ready GeoJSON for the external map layer.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.len());
        for building in &self.buildings {
            let mut properties = base_properties("building", building);
            properties.insert("height".to_string(), json!(building.height));
            properties.insert("color".to_string(), json!(building.color));
            properties.insert("area".to_string(), json!(building.footprint_area()));
            features.push(to_feature(building, ring_geometry(&building.coordinates), properties));
        }
        for road in &self.roads {
            let mut properties = base_properties("road", road);
            properties.insert("width".to_string(), json!(road.width));
            properties.insert("length".to_string(), json!(road.length()));
            let line = Value::LineString(road.coordinates.iter().map(position).collect());
            features.push(to_feature(road, Geometry::new(line), properties));
        }
        for point in &self.points {
            let properties = base_properties("point", point);
            let geometry = Geometry::new(Value::Point(position(&point.coordinate)));
            features.push(to_feature(point, geometry, properties));
        }
        for polygon in &self.polygons {
            let properties = base_properties("polygon", polygon);
            features.push(to_feature(polygon, ring_geometry(&polygon.coordinates), properties));
        }

        let mut foreign_members = JsonObject::new();
        foreign_members.insert(
            "terrain_elevation".to_string(),
            json!(self.terrain_elevation),
        );
        FeatureCollection {
            bbox: Some(self.bounds().as_array().to_vec()),
            features,
            foreign_members: Some(foreign_members),
        }
    }
}

impl From<&GeoDataCollection> for FeatureCollection {
    fn from(collection: &GeoDataCollection) -> Self {
        collection.to_geojson()
    }
}

fn keep_matching<T, F>(features: &[T], keep: &F) -> Vec<T>
where
    T: GeoFeature + Clone,
    F: Fn(&dyn GeoFeature) -> bool,
{
    features
        .iter()
        .filter(|feature| keep(*feature))
        .cloned()
        .collect()
}

fn sanitize_elevation(elevation: f64) -> f64 {
    if elevation.is_finite() {
        elevation.max(0.0)
    } else {
        0.0
    }
}

fn position(coord: &Coordinate) -> Vec<f64> {
    coord.as_array().to_vec()
}

fn ring_geometry(ring: &[Coordinate]) -> Geometry {
    Geometry::new(Value::Polygon(vec![ring.iter().map(position).collect()]))
}

fn base_properties(kind: &str, feature: &dyn GeoFeature) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!(kind));
    properties.insert("name".to_string(), json!(feature.name()));
    properties.insert("type".to_string(), json!(feature.feature_type()));
    properties.insert("tags".to_string(), json!(feature.tags()));
    properties
}

fn to_feature(feature: &dyn GeoFeature, geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: feature.id().map(|id| match id {
            FeatureId::Number(n) => Id::Number(serde_json::Number::from(*n)),
            FeatureId::Text(s) => Id::String(s.clone()),
        }),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeatureInfo;
    use serde_json::Value as JsonValue;

    fn feature_kind(feature: &Feature) -> Option<&str> {
        feature
            .properties
            .as_ref()
            .and_then(|p| p.get("kind"))
            .and_then(JsonValue::as_str)
    }

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    fn square(lon: f64, lat: f64, size: f64) -> Vec<Coordinate> {
        vec![
            c(lon, lat),
            c(lon + size, lat),
            c(lon + size, lat + size),
            c(lon, lat + size),
            c(lon, lat),
        ]
    }

    fn sample_collection() -> GeoDataCollection {
        let building = Building {
            info: FeatureInfo::new(
                Some(FeatureId::Number(1)),
                "Town Hall",
                "office",
                tags(&[("building", "office"), ("name", "Town Hall")]),
            ),
            coordinates: square(10.0, 50.0, 0.001),
            height: 15.0,
            color: [74, 140, 247, 200],
        };
        let road = Road {
            info: FeatureInfo::new(
                Some(FeatureId::Number(2)),
                "Primary",
                "primary",
                tags(&[("highway", "primary")]),
            ),
            coordinates: vec![c(10.0, 50.0), c(10.01, 50.02)],
            width: 3.0,
        };
        let point = Point {
            info: FeatureInfo::new(
                Some(FeatureId::Number(3)),
                "Cafe",
                "cafe",
                tags(&[("amenity", "cafe")]),
            ),
            coordinate: c(9.99, 50.005),
        };
        let polygon = Polygon {
            info: FeatureInfo::new(
                Some(FeatureId::Number(4)),
                "Forest",
                "forest",
                tags(&[("landuse", "forest")]),
            ),
            coordinates: square(10.005, 49.99, 0.002),
        };
        GeoDataCollection::new(vec![building], vec![road], vec![point], vec![polygon], 42.0)
    }

    #[test]
    fn test_empty_collection_bounds() {
        let collection = GeoDataCollection::default();
        assert!(collection.is_empty());
        assert_eq!(collection.bounds().as_array(), [-0.01, -0.01, 0.01, 0.01]);
        assert_eq!(collection.center(), c(0.0, 0.0));
    }

    #[test]
    fn test_bounds_cover_all_features() {
        let collection = sample_collection();
        assert_eq!(collection.len(), 4);
        assert_eq!(
            collection.bounds().as_array(),
            [9.99, 49.99, 10.01, 50.02]
        );
    }

    #[test]
    fn test_empty_tag_filter_is_identity() {
        let collection = sample_collection();
        assert_eq!(collection.filter_by_tags(&Tags::new()), collection);
    }

    #[test]
    fn test_tag_filter_requires_all_pairs() {
        let collection = sample_collection();
        let offices = collection.filter_by_tags(&tags(&[("building", "office")]));
        assert_eq!(offices.buildings().len(), 1);
        assert_eq!(offices.len(), 1);
        assert_eq!(offices.terrain_elevation(), 42.0);

        let none = collection.filter_by_tags(&tags(&[("building", "office"), ("name", "Other")]));
        assert!(none.is_empty());
    }

    #[test]
    fn test_full_extent_bounds_filter_keeps_everything() {
        let collection = sample_collection();
        let filtered = collection.filter_by_bounds(&collection.bounds());
        assert_eq!(filtered.len(), collection.len());
        assert_eq!(filtered, collection);
    }

    #[test]
    fn test_bounds_filter_any_vertex() {
        let collection = sample_collection();
        // only the road's far end lies in here
        let bbox = BoundingBox::new(10.009, 50.019, 10.02, 50.03).unwrap();
        let filtered = collection.filter_by_bounds(&bbox);
        assert_eq!(filtered.roads().len(), 1);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filters_leave_source_untouched() {
        let collection = sample_collection();
        let before = collection.clone();
        let _ = collection.filter_by_tags(&tags(&[("amenity", "cafe")]));
        let _ = collection.filter_by_bounds(&BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap());
        assert_eq!(collection, before);
    }

    #[test]
    fn test_terrain_elevation_is_sanitized() {
        let nan = GeoDataCollection::new(vec![], vec![], vec![], vec![], f64::NAN);
        assert_eq!(nan.terrain_elevation(), 0.0);
        let below = GeoDataCollection::new(vec![], vec![], vec![], vec![], -12.0);
        assert_eq!(below.terrain_elevation(), 0.0);
    }

    #[test]
    fn test_geojson_export() {
        let collection = sample_collection();
        let fc = collection.to_geojson();
        assert_eq!(fc.features.len(), 4);
        let kinds: Vec<&str> = fc.features.iter().filter_map(feature_kind).collect();
        assert_eq!(kinds, vec!["building", "road", "point", "polygon"]);

        let building = &fc.features[0];
        assert_eq!(building.id, Some(Id::Number(serde_json::Number::from(1i64))));
        match &building.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => assert_eq!(rings[0].len(), 5),
            other => panic!("expected polygon, got {:?}", other),
        }
        let properties = building.properties.as_ref().unwrap();
        assert_eq!(properties["height"], json!(15.0));
        assert_eq!(properties["color"], json!([74, 140, 247, 200]));

        let road = &fc.features[1];
        assert!(matches!(
            road.geometry.as_ref().unwrap().value,
            Value::LineString(_)
        ));
        assert_eq!(
            fc.foreign_members.as_ref().unwrap()["terrain_elevation"],
            json!(42.0)
        );
        assert_eq!(fc.bbox, Some(vec![9.99, 49.99, 10.01, 50.02]));
    }
}
