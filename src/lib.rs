pub mod collection;
pub mod color;
pub mod domain;
pub mod generation;
pub mod geometry;
pub mod processing;
pub mod services;
pub mod utils;

pub use collection::GeoDataCollection;
pub use domain::{Building, DomainEntity, FeatureId, GeoFeature, Point, Polygon, Road, Tags};
pub use geometry::{BoundingBox, Coordinate};
pub use processing::{ClassificationStats, FeatureClassifier, GeoPipeline, summarize};
pub use utils::config::Config;
pub use utils::error::{Error, Result};
