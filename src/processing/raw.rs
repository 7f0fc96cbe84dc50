use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{FeatureId, Tags};
use crate::geometry::Coordinate;

/// One record of the `elements` array of a query response.
///
/// Only the fields the classifier reads are kept; anything else in the
/// record is ignored.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct RawElement {
    #[serde(rename = "type", default)]
    pub type_field: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub geometry: Option<Vec<Option<RawLatLon>>>,
}

/// Vertex of a way's inline geometry.
#[derive(Default, Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawLatLon {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl RawElement {
    pub fn from_value(value: &Value) -> Option<Self> {
        RawElement::deserialize(value).ok()
    }

    pub fn feature_id(&self) -> Option<FeatureId> {
        match self.id.as_ref()? {
            Value::Number(number) => number.as_i64().map(FeatureId::Number),
            Value::String(text) => Some(FeatureId::Text(text.clone())),
            _ => None,
        }
    }

    /// String tags; non-string scalars are kept in their JSON text form and
    /// nulls are dropped.
    pub fn tags(&self) -> Tags {
        let Some(tags) = self.tags.as_ref() else {
            return Tags::new();
        };
        tags.iter()
            .filter_map(|(key, value)| match value {
                Value::String(text) => Some((key.clone(), text.clone())),
                Value::Null => None,
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }

    pub fn has_tags(&self) -> bool {
        self.tags.as_ref().is_some_and(|tags| !tags.is_empty())
    }

    pub fn position(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lon?, self.lat?))
    }

    /// Way vertices in order, skipping null entries and entries lacking a
    /// latitude or longitude.
    pub fn way_coordinates(&self) -> Vec<Coordinate> {
        self.geometry
            .iter()
            .flatten()
            .flatten()
            .filter_map(|vertex| Some(Coordinate::new(vertex.lon?, vertex.lat?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_fields() {
        let element = RawElement::from_value(&json!({
            "type": "node",
            "id": 42,
            "lat": 52.5,
            "lon": 13.4,
            "tags": {"amenity": "cafe", "capacity": 20, "note": null}
        }))
        .unwrap();
        assert_eq!(element.type_field, "node");
        assert_eq!(element.feature_id(), Some(FeatureId::Number(42)));
        assert_eq!(element.position(), Some(Coordinate::new(13.4, 52.5)));
        let tags = element.tags();
        assert_eq!(tags.get("amenity").map(String::as_str), Some("cafe"));
        assert_eq!(tags.get("capacity").map(String::as_str), Some("20"));
        assert!(!tags.contains_key("note"));
    }

    #[test]
    fn test_way_geometry_skips_unusable_vertices() {
        let element = RawElement::from_value(&json!({
            "type": "way",
            "id": "w1",
            "geometry": [
                {"lat": 1.0, "lon": 2.0},
                null,
                {"lat": 3.0},
                {"lat": 5.0, "lon": 6.0}
            ]
        }))
        .unwrap();
        assert_eq!(element.feature_id(), Some(FeatureId::Text("w1".into())));
        assert_eq!(
            element.way_coordinates(),
            vec![Coordinate::new(2.0, 1.0), Coordinate::new(6.0, 5.0)]
        );
        assert!(!element.has_tags());
    }

    #[test]
    fn test_missing_fields_default() {
        let element = RawElement::from_value(&json!({"type": "relation"})).unwrap();
        assert_eq!(element.feature_id(), None);
        assert!(element.tags().is_empty());
        assert_eq!(element.position(), None);
        assert!(element.way_coordinates().is_empty());

        let null_tags = RawElement::from_value(&json!({"type": "node", "tags": null})).unwrap();
        assert!(!null_tags.has_tags());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(RawElement::from_value(&json!(17)).is_none());
        assert!(RawElement::from_value(&json!({"type": "node", "lat": "north"})).is_none());
    }
}
