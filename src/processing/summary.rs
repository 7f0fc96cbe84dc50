use crate::collection::GeoDataCollection;
use crate::domain::GeoFeature;

pub const NO_DATA_MESSAGE: &str = "No data to display. Try a different query.";

const TOP_TYPES: usize = 3;

/// Human readable overview of a collection, one line per finding.
pub fn summarize(collection: Option<&GeoDataCollection>) -> String {
    let Some(collection) = collection.filter(|c| !c.is_empty()) else {
        return NO_DATA_MESSAGE.to_string();
    };

    let mut lines = Vec::new();

    let buildings = collection.buildings();
    if !buildings.is_empty() {
        let average = buildings.iter().map(|b| b.height).sum::<f64>() / buildings.len() as f64;
        let types = top_types(
            buildings
                .iter()
                .map(|b| b.get_tag("building", Some("unknown")).unwrap_or("unknown")),
        );
        lines.push(format!(
            "{} buildings found with average height of {:.1}m",
            buildings.len(),
            average
        ));
        lines.push(format!("   Most common types: {}", types));
    }

    let roads = collection.roads();
    if !roads.is_empty() {
        let total_km = roads.iter().map(|r| r.length()).sum::<f64>() / 1000.0;
        lines.push(format!(
            "{} roads found, approximately {:.1} km total length",
            roads.len(),
            total_km
        ));
        lines.push(format!(
            "   Most common types: {}",
            top_types(roads.iter().map(|r| r.highway()))
        ));
    }

    let points = collection.points();
    if !points.is_empty() {
        lines.push(format!("{} points of interest found", points.len()));
        lines.push(format!(
            "   Types: {}",
            top_types(points.iter().map(|p| p.feature_type()))
        ));
    }

    let polygons = collection.polygons();
    if !polygons.is_empty() {
        lines.push(format!("{} areas/polygons found", polygons.len()));
        lines.push(format!(
            "   Types: {}",
            top_types(polygons.iter().map(|p| p.feature_type()))
        ));
    }

    if collection.terrain_elevation() > 0.0 {
        lines.push(format!(
            "Terrain elevation: approximately {:.1}m above sea level",
            collection.terrain_elevation()
        ));
    }

    lines.join("\n")
}

/// "a (3), b (2), c (1)" for the most frequent values; ties keep the order
/// in which the values first appeared.
fn top_types<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .iter()
        .take(TOP_TYPES)
        .map(|(value, count)| format!("{} ({})", value, count))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Building, FeatureInfo, Point, Road, Tags};
    use crate::geometry::Coordinate;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn building(kind: &str, height: f64) -> Building {
        Building {
            info: FeatureInfo::new(None, "Building", kind, tags(&[("building", kind)])),
            coordinates: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.001, 0.0),
                Coordinate::new(0.001, 0.001),
                Coordinate::new(0.0, 0.0),
            ],
            height,
            color: [0, 0, 0, 255],
        }
    }

    fn point(kind: &str) -> Point {
        Point {
            info: FeatureInfo::new(None, kind, kind, tags(&[("amenity", kind)])),
            coordinate: Coordinate::new(0.0, 0.0),
        }
    }

    #[test]
    fn test_no_data() {
        assert_eq!(summarize(None), NO_DATA_MESSAGE);
        assert_eq!(summarize(Some(&GeoDataCollection::default())), NO_DATA_MESSAGE);
    }

    #[test]
    fn test_building_and_point_lines() {
        let collection = GeoDataCollection::new(
            vec![building("house", 6.0), building("office", 15.0), building("house", 9.0)],
            vec![],
            vec![point("cafe"), point("bench"), point("bench")],
            vec![],
            0.0,
        );
        let summary = summarize(Some(&collection));
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "3 buildings found with average height of 10.0m");
        assert_eq!(lines[1], "   Most common types: house (2), office (1)");
        assert_eq!(lines[2], "3 points of interest found");
        assert_eq!(lines[3], "   Types: bench (2), cafe (1)");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_road_length_and_terrain_line() {
        // one degree of latitude along a meridian
        let road = Road {
            info: FeatureInfo::new(None, "Primary", "primary", tags(&[("highway", "primary")])),
            coordinates: vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)],
            width: 3.0,
        };
        let collection = GeoDataCollection::new(vec![], vec![road], vec![], vec![], 34.56);
        let summary = summarize(Some(&collection));
        assert!(summary.starts_with("1 roads found, approximately 111.2 km total length"));
        assert!(summary.contains("   Most common types: primary (1)"));
        assert!(summary.ends_with("Terrain elevation: approximately 34.6m above sea level"));
    }

    #[test]
    fn test_top_types_ties_keep_first_seen_order() {
        let values = ["b", "a", "c", "d", "a", "b"];
        assert_eq!(top_types(values.into_iter()), "b (2), a (2), c (1)");
    }
}
