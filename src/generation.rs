use rand::Rng;
use rand::SeedableRng;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use serde_json::{Value, json};

use crate::geometry::BoundingBox;

const BUILDING_TYPES: [&str; 8] = [
    "yes",
    "house",
    "apartments",
    "office",
    "retail",
    "church",
    "school",
    "warehouse",
];
const HIGHWAY_TYPES: [&str; 6] = [
    "residential",
    "primary",
    "secondary",
    "service",
    "footway",
    "track",
];
const AMENITIES: [&str; 5] = ["cafe", "restaurant", "bench", "pharmacy", "school"];
const LANDUSES: [&str; 4] = ["grass", "forest", "residential", "meadow"];

/// Generates an Overpass-style response with `num_elements` elements spread
/// over `bounds`.
///
/// The same seed always yields the same response. Roughly 40% of the
/// elements are buildings, 25% roads, 20% tagged nodes and 10% landuse
/// areas; the rest are untagged nodes, open fences and relations so every
/// classification branch is exercised.
pub fn generate_overpass_response(num_elements: usize, bounds: &BoundingBox, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let lon_range = Uniform::from(bounds.min_lon()..=bounds.max_lon());
    let lat_range = Uniform::from(bounds.min_lat()..=bounds.max_lat());
    let size = (bounds.max_lon() - bounds.min_lon()).max(1e-6) / 200.0;

    let mut elements = Vec::with_capacity(num_elements);
    for id in 0..num_elements as i64 {
        let lon = rng.sample(lon_range);
        let lat = rng.sample(lat_range);
        let roll = rng.r#gen::<f64>();
        let element = if roll < 0.40 {
            let kind = BUILDING_TYPES[rng.gen_range(0..BUILDING_TYPES.len())];
            let mut tags = json!({ "building": kind });
            match rng.gen_range(0..3) {
                0 => tags["height"] = json!(format!("{:.1} m", rng.gen_range(3.0..60.0))),
                1 => tags["building:levels"] = json!(rng.gen_range(1..20).to_string()),
                _ => {}
            }
            let open = rng.r#gen::<f64>() < 0.1;
            json!({
                "type": "way",
                "id": id,
                "geometry": ring(lon, lat, size, !open),
                "tags": tags,
            })
        } else if roll < 0.65 {
            let kind = HIGHWAY_TYPES[rng.gen_range(0..HIGHWAY_TYPES.len())];
            let steps = rng.gen_range(2..8);
            let geometry: Vec<Value> = (0..steps)
                .map(|step| {
                    json!({
                        "lat": lat + step as f64 * size * rng.gen_range(-1.0..1.0),
                        "lon": lon + step as f64 * size,
                    })
                })
                .collect();
            json!({
                "type": "way",
                "id": id,
                "geometry": geometry,
                "tags": { "highway": kind, "name": format!("Street {}", id) },
            })
        } else if roll < 0.85 {
            let kind = AMENITIES[rng.gen_range(0..AMENITIES.len())];
            json!({
                "type": "node",
                "id": id,
                "lat": lat,
                "lon": lon,
                "tags": { "amenity": kind },
            })
        } else if roll < 0.95 {
            let kind = LANDUSES[rng.gen_range(0..LANDUSES.len())];
            json!({
                "type": "way",
                "id": id,
                "geometry": ring(lon, lat, size * 4.0, true),
                "tags": { "landuse": kind },
            })
        } else {
            match rng.gen_range(0..3) {
                0 => json!({ "type": "node", "id": id, "lat": lat, "lon": lon }),
                1 => json!({
                    "type": "way",
                    "id": id,
                    "geometry": ring(lon, lat, size, false),
                    "tags": { "barrier": "fence" },
                }),
                _ => json!({ "type": "relation", "id": id, "members": [] }),
            }
        };
        elements.push(element);
    }

    json!({ "version": 0.6, "generator": "geoviz3d synthetic", "elements": elements })
}

/// Axis-aligned square with its south-west corner at (`lon`, `lat`).
fn ring(lon: f64, lat: f64, size: f64, closed: bool) -> Vec<Value> {
    let mut vertices = vec![
        json!({ "lat": lat, "lon": lon }),
        json!({ "lat": lat, "lon": lon + size }),
        json!({ "lat": lat + size, "lon": lon + size }),
        json!({ "lat": lat + size, "lon": lon }),
    ];
    if closed {
        vertices.push(json!({ "lat": lat, "lon": lon }));
    }
    vertices
}

/// Smooth synthetic elevation grid for hillshading and color benchmarks.
pub fn generate_elevation_grid(rows: usize, cols: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let phase: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let amplitude: f64 = rng.gen_range(50.0..500.0);
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    let x = r as f64 / rows.max(1) as f64;
                    let y = c as f64 / cols.max(1) as f64;
                    amplitude * (1.0 + (x * 6.0 + phase).sin() * (y * 4.0).cos())
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::FeatureClassifier;
    use crate::services::FlatTerrain;

    fn bounds() -> BoundingBox {
        BoundingBox::new(13.3, 52.4, 13.5, 52.6).unwrap()
    }

    #[test]
    fn test_same_seed_same_response() {
        let a = generate_overpass_response(50, &bounds(), 7);
        let b = generate_overpass_response(50, &bounds(), 7);
        let c = generate_overpass_response(50, &bounds(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a["elements"].as_array().map(Vec::len), Some(50));
    }

    #[test]
    fn test_generated_response_classifies() {
        let raw = generate_overpass_response(500, &bounds(), 42);
        let (collection, stats) = FeatureClassifier::default()
            .classify_with_stats(&raw, &mut FlatTerrain)
            .unwrap();
        assert_eq!(stats.processed, 500);
        assert_eq!(stats.malformed, 0);
        assert!(!collection.buildings().is_empty());
        assert!(!collection.roads().is_empty());
        assert!(!collection.points().is_empty());
        assert!(!collection.polygons().is_empty());
        assert_eq!(stats.features() + stats.skipped(), 500);
        assert!(collection.coordinates().all(|c| bounds_with_margin().contains(c)));
    }

    fn bounds_with_margin() -> BoundingBox {
        BoundingBox::new(13.2, 52.3, 13.6, 52.7).unwrap()
    }

    #[test]
    fn test_elevation_grid_shape() {
        let grid = generate_elevation_grid(8, 5, 1);
        assert_eq!(grid.len(), 8);
        assert!(grid.iter().all(|row| row.len() == 5));
        assert!(grid.iter().flatten().all(|v| v.is_finite() && *v >= 0.0));
    }
}
