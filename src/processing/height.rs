use log::trace;

use crate::domain::Tags;
use crate::processing::tables::{DEFAULT_BUILDING_TYPE, METERS_PER_LEVEL, base_height};
use crate::utils::error::{Error, Result};

const HEIGHT_TAG: &str = "height";
const LEVELS_TAG: &str = "building:levels";

/// Steps of the height fallback chain, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeightSource {
    ExplicitHeight,
    Levels,
    TypeDefault,
}

/// Building height in metres: the explicit `height` tag, else
/// `building:levels` times 3 m, else the per-type default. The result is
/// multiplied by `factor`.
pub fn estimate_building_height(tags: &Tags, factor: f64) -> f64 {
    let mut source = HeightSource::ExplicitHeight;
    loop {
        let attempt = match source {
            HeightSource::ExplicitHeight => explicit_height(tags),
            HeightSource::Levels => levels_height(tags),
            HeightSource::TypeDefault => {
                let building_type = tags
                    .get("building")
                    .map_or(DEFAULT_BUILDING_TYPE, String::as_str);
                return base_height(building_type) * factor;
            }
        };
        match attempt {
            Ok(height) => return height * factor,
            Err(err) => {
                trace!("{:?} unusable: {}", source, err);
                source = match source {
                    HeightSource::ExplicitHeight => HeightSource::Levels,
                    _ => HeightSource::TypeDefault,
                };
            }
        }
    }
}

/// Leading token of the `height` tag, so "20 m" reads as 20.
fn explicit_height(tags: &Tags) -> Result<f64> {
    let raw = tag(tags, HEIGHT_TAG)?;
    let token = raw.split_whitespace().next().unwrap_or_default();
    parse_positive(HEIGHT_TAG, raw, token)
}

fn levels_height(tags: &Tags) -> Result<f64> {
    let raw = tag(tags, LEVELS_TAG)?;
    Ok(parse_positive(LEVELS_TAG, raw, raw.trim())? * METERS_PER_LEVEL)
}

fn tag<'a>(tags: &'a Tags, key: &str) -> Result<&'a str> {
    tags.get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingTag(key.to_string()))
}

fn parse_positive(key: &str, raw: &str, token: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(Error::TagParse {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_explicit_height_with_unit() {
        let t = tags(&[("building", "yes"), ("height", "12.5 m")]);
        assert_eq!(estimate_building_height(&t, 2.0), 25.0);
        let plain = tags(&[("height", "20")]);
        assert_eq!(estimate_building_height(&plain, 1.0), 20.0);
    }

    #[test]
    fn test_height_wins_over_levels() {
        let t = tags(&[("height", "7"), ("building:levels", "10")]);
        assert_eq!(estimate_building_height(&t, 1.0), 7.0);
    }

    #[test]
    fn test_levels_fallback() {
        let t = tags(&[("building", "yes"), ("building:levels", "4")]);
        assert_eq!(estimate_building_height(&t, 1.0), 12.0);
        assert_eq!(estimate_building_height(&t, 1.5), 18.0);
    }

    #[test]
    fn test_unparsable_height_falls_through_to_levels() {
        let t = tags(&[("height", "tall"), ("building:levels", "2")]);
        assert_eq!(estimate_building_height(&t, 1.0), 6.0);
        // a unit glued to the number is not a number
        let glued = tags(&[("height", "12m"), ("building:levels", "3")]);
        assert_eq!(estimate_building_height(&glued, 1.0), 9.0);
    }

    #[test]
    fn test_type_default() {
        let office = tags(&[("building", "office")]);
        assert_eq!(estimate_building_height(&office, 1.0), 15.0);
        assert_eq!(estimate_building_height(&office, 2.0), 30.0);
        let unknown = tags(&[("building", "bunker")]);
        assert_eq!(estimate_building_height(&unknown, 1.0), 8.0);
        assert_eq!(estimate_building_height(&Tags::new(), 1.0), 8.0);
    }

    #[test]
    fn test_bad_values_never_surface() {
        for bad in ["", "  ", "-3", "0", "NaN", "inf", "three"] {
            let t = tags(&[("building", "house"), ("height", bad), ("building:levels", bad)]);
            assert_eq!(estimate_building_height(&t, 1.0), 6.0, "value {:?}", bad);
        }
    }

    #[test]
    fn test_errors_name_the_tag() {
        assert!(matches!(
            explicit_height(&Tags::new()),
            Err(Error::MissingTag(key)) if key == "height"
        ));
        assert!(matches!(
            levels_height(&tags(&[("building:levels", "many")])),
            Err(Error::TagParse { key, value }) if key == "building:levels" && value == "many"
        ));
    }
}
