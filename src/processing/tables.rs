//! Lookup tables keyed by OSM tag values.

/// Tag keys deciding a point's type, highest priority first.
pub const POINT_TYPE_KEYS: [&str; 5] = ["amenity", "shop", "tourism", "historic", "leisure"];
pub const POINT_FALLBACK_TYPE: &str = "point";

/// Tag keys deciding a polygon's type, highest priority first.
pub const POLYGON_TYPE_KEYS: [&str; 3] = ["landuse", "natural", "leisure"];
pub const POLYGON_FALLBACK_TYPE: &str = "other";

pub const DEFAULT_BUILDING_TYPE: &str = "yes";
pub const DEFAULT_HIGHWAY_TYPE: &str = "road";
pub const DEFAULT_BUILDING_NAME: &str = "Building";

pub const METERS_PER_LEVEL: f64 = 3.0;
pub const DEFAULT_BUILDING_HEIGHT: f64 = 8.0;
pub const DEFAULT_BUILDING_COLOR: [u8; 4] = [74, 140, 247, 200];
pub const DEFAULT_ROAD_WIDTH: f64 = 1.5;

/// Unscaled height in metres for a `building` tag value.
pub fn base_height(building_type: &str) -> f64 {
    match building_type {
        "apartments" => 15.0,
        "residential" => 8.0,
        "house" | "detached" => 6.0,
        "commercial" => 10.0,
        "industrial" => 8.0,
        "office" => 15.0,
        "retail" => 6.0,
        "warehouse" => 8.0,
        "church" => 15.0,
        "cathedral" => 25.0,
        "mosque" | "temple" | "synagogue" => 15.0,
        "school" => 9.0,
        "university" => 12.0,
        "hospital" => 15.0,
        "hotel" => 15.0,
        "train_station" => 12.0,
        "stadium" => 20.0,
        _ => DEFAULT_BUILDING_HEIGHT,
    }
}

/// RGBA fill for a `building` tag value.
pub fn building_color(building_type: &str) -> [u8; 4] {
    match building_type {
        "apartments" | "residential" => [102, 102, 156, 200],
        "house" | "detached" => [119, 119, 165, 200],
        "commercial" => [99, 99, 184, 200],
        "industrial" | "warehouse" => [150, 150, 150, 200],
        "retail" => [61, 129, 224, 200],
        "church" | "cathedral" | "mosque" | "temple" | "synagogue" => [251, 140, 0, 200],
        "school" => [255, 128, 128, 200],
        "university" => [255, 100, 100, 200],
        "hospital" => [226, 122, 171, 200],
        "hotel" | "train_station" => [51, 163, 255, 200],
        "stadium" => [54, 202, 155, 200],
        _ => DEFAULT_BUILDING_COLOR,
    }
}

/// Rendered width in metres for a `highway` tag value.
pub fn road_width(highway_type: &str) -> f64 {
    match highway_type {
        "motorway" => 4.0,
        "trunk" => 3.5,
        "primary" => 3.0,
        "secondary" => 2.5,
        "tertiary" => 2.0,
        "residential" | "unclassified" => 1.5,
        "service" | "track" => 1.0,
        "footway" | "cycleway" | "path" => 0.5,
        _ => DEFAULT_ROAD_WIDTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_heights() {
        assert_eq!(base_height("cathedral"), 25.0);
        assert_eq!(base_height("house"), 6.0);
        assert_eq!(base_height("stadium"), 20.0);
        assert_eq!(base_height("yes"), 8.0);
        assert_eq!(base_height("castle"), 8.0);
    }

    #[test]
    fn test_building_colors() {
        assert_eq!(building_color("church"), [251, 140, 0, 200]);
        assert_eq!(building_color("office"), DEFAULT_BUILDING_COLOR);
        assert_eq!(building_color("yes"), DEFAULT_BUILDING_COLOR);
        assert_eq!(building_color("garage"), DEFAULT_BUILDING_COLOR);
    }

    #[test]
    fn test_road_widths() {
        assert_eq!(road_width("motorway"), 4.0);
        assert_eq!(road_width("path"), 0.5);
        assert_eq!(road_width("track"), 1.0);
        assert_eq!(road_width("living_street"), 1.5);
    }

    #[test]
    fn test_priority_lists_are_ordered() {
        assert_eq!(POINT_TYPE_KEYS[0], "amenity");
        assert_eq!(POINT_TYPE_KEYS[4], "leisure");
        assert_eq!(POLYGON_TYPE_KEYS, ["landuse", "natural", "leisure"]);
    }
}
